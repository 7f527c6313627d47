#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use planar_find::{BriefExtractor, BruteForceHamming, FastDetector, Feature};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

const CELL: u32 = 8;

pub fn init_logger() {
    let _ = pretty_env_logger::try_init();
}

/// Random gray blocks, slightly smoothed so corners have a well defined response.
pub fn texture(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let columns = (width + CELL - 1) / CELL;
    let rows = (height + CELL - 1) / CELL;
    let cells: Vec<u8> = (0..columns * rows).map(|_| rng.gen()).collect();
    let blocks = GrayImage::from_fn(width, height, |x, y| {
        Luma([cells[((y / CELL) * columns + x / CELL) as usize]])
    });
    gaussian_blur_f32(&blocks, 1.0)
}

/// `top` drawn onto `canvas` with its top left corner at `(x, y)`.
pub fn paste(canvas: &GrayImage, top: &GrayImage, x: u32, y: u32) -> GrayImage {
    let mut out = canvas.clone();
    for (tx, ty, pixel) in top.enumerate_pixels() {
        if x + tx < out.width() && y + ty < out.height() {
            out.put_pixel(x + tx, y + ty, *pixel);
        }
    }
    out
}

pub fn full_roi(image: &GrayImage) -> GrayImage {
    GrayImage::from_pixel(image.width(), image.height(), Luma([255]))
}

pub fn gray(image: GrayImage) -> DynamicImage {
    DynamicImage::ImageLuma8(image)
}

/// FAST corners with BRIEF descriptors, which is much faster than AKAZE on test images.
pub fn fast_feature() -> Feature {
    Feature::builder()
        .detector(FastDetector {
            threshold: 20,
            max_keypoints: 5000,
        })
        .extractor(BriefExtractor::default())
        .matcher(BruteForceHamming::default())
        .build()
        .unwrap()
}
