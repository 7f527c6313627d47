use criterion::{criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use planar_find::{DetectionFilter, Detector, Feature, Modelbase, PlanarModel, DEFAULT_COLOR};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn texture(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let columns = (width + 7) / 8;
    let cells: Vec<u8> = (0..columns * ((height + 7) / 8)).map(|_| rng.gen()).collect();
    let blocks = GrayImage::from_fn(width, height, |x, y| Luma([cells[((y / 8) * columns + x / 8) as usize]]));
    gaussian_blur_f32(&blocks, 1.0)
}

fn detector(models: u64) -> Detector {
    let feature = Feature::from_names("FAST", "BRIEF", "BruteForce-Hamming").unwrap();
    let mut modelbase = Modelbase::new(feature.clone());
    for seed in 0..models {
        let image = texture(320, 240, seed);
        let roi = GrayImage::from_pixel(320, 240, Luma([255]));
        let model = PlanarModel::create(format!("model{}", seed), DynamicImage::ImageLuma8(image), roi, DEFAULT_COLOR, &feature)
            .unwrap();
        modelbase.add(model);
    }
    let filter = DetectionFilter::eigenvalue(1.0 / 3.0, 3.0) & DetectionFilter::inliers_ratio(0.10);
    Detector::new(modelbase, feature, filter)
}

fn detect(c: &mut Criterion) {
    let _ = pretty_env_logger::try_init();
    let detector = detector(4);
    let scene = detector
        .describe(DynamicImage::ImageLuma8(texture(320, 240, 2)))
        .unwrap();
    c.bench_function("describe", |b| {
        b.iter(|| detector.describe(scene.image.clone()).unwrap())
    });
    c.bench_function("detect", |b| b.iter(|| detector.detect(&scene).len()));
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = detect
);
criterion_main!(benches);
