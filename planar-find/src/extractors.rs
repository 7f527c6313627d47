use crate::{
    detectors::{from_akaze, mask_allows},
    DescriptorExtractor, FeatureDetector,
};
use akaze::Akaze;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::filter::gaussian_blur_f32;
use log::*;
use planar_core::{bitarray::BitArray, Descriptor, KeyPoint};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;

const DESCRIPTOR_BITS: usize = 512;

/// Computes AKAZE's modified local difference binary descriptors.
///
/// The AKAZE descriptor is tied to the scale space it was detected in, so this extractor only
/// supports [`crate::AkazeDetector`]. Through [`DescriptorExtractor::detect_and_compute`] the
/// pipeline runs once, with the detector's configuration. [`DescriptorExtractor::compute`]
/// reruns it with this extractor's configuration and drops keypoints that AKAZE did not
/// detect at exactly the same location.
#[derive(Debug, Clone, Copy, Default)]
pub struct AkazeExtractor {
    pub akaze: Akaze,
}

impl AkazeExtractor {
    pub fn new(threshold: f64) -> Self {
        Self {
            akaze: Akaze::new(threshold),
        }
    }
}

impl DescriptorExtractor for AkazeExtractor {
    fn name(&self) -> &str {
        "AKAZE"
    }

    fn compute(
        &self,
        image: &DynamicImage,
        keypoints: Vec<KeyPoint>,
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        if keypoints.is_empty() || image.width() == 0 || image.height() == 0 {
            return (vec![], vec![]);
        }
        let (detected, descriptors) = self.akaze.extract(image);
        let by_location: HashMap<(u32, u32), usize> = detected
            .iter()
            .enumerate()
            .map(|(ix, keypoint)| ((keypoint.point.0.to_bits(), keypoint.point.1.to_bits()), ix))
            .collect();

        let requested = keypoints.len();
        let (keypoints, descriptors): (Vec<KeyPoint>, Vec<Descriptor>) = keypoints
            .into_iter()
            .filter_map(|keypoint| {
                let key = (
                    (keypoint.point.x as f32).to_bits(),
                    (keypoint.point.y as f32).to_bits(),
                );
                by_location
                    .get(&key)
                    .map(|&ix| (from_akaze(&detected[ix]), descriptors[ix].clone()))
            })
            .unzip();
        if keypoints.len() < requested {
            warn!(
                "AKAZE described {} of {} keypoints; the rest were not AKAZE detections",
                keypoints.len(),
                requested
            );
        }
        (keypoints, descriptors)
    }

    fn supports(&self, detector: &dyn FeatureDetector) -> bool {
        detector.akaze().is_some()
    }

    fn detect_and_compute(
        &self,
        detector: &dyn FeatureDetector,
        image: &DynamicImage,
        mask: Option<&GrayImage>,
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        let akaze = match detector.akaze() {
            Some(akaze) => akaze,
            None => return self.compute(image, detector.detect(image, mask)),
        };
        if image.width() == 0 || image.height() == 0 {
            return (vec![], vec![]);
        }
        let (detected, descriptors) = akaze.extract(image);
        let (keypoints, descriptors): (Vec<KeyPoint>, Vec<Descriptor>) = detected
            .iter()
            .map(from_akaze)
            .zip(descriptors)
            .filter(|(keypoint, _)| mask_allows(mask, keypoint))
            .unzip();
        debug!("AKAZE detected and described {} keypoints", keypoints.len());
        (keypoints, descriptors)
    }
}

/// Steered BRIEF: 512 intensity comparisons on a smoothed patch, rotated by the keypoint angle.
///
/// The sampling pattern is drawn once from `seed`, so two extractors with the same `radius`
/// and `seed` produce comparable descriptors. Keypoints whose patch would leave the image are
/// dropped.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    radius: i32,
    seed: u64,
    sigma: f32,
    pattern: Vec<[(f32, f32); 2]>,
}

impl BriefExtractor {
    pub fn new(radius: u32, seed: u64) -> Self {
        let radius = radius.max(1) as i32;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let bound = radius as f32;
        let mut sample = move || loop {
            let offset: (f32, f32) = (rng.gen_range(-bound..=bound), rng.gen_range(-bound..=bound));
            if offset.0 * offset.0 + offset.1 * offset.1 <= bound * bound {
                return offset;
            }
        };
        let pattern = (0..DESCRIPTOR_BITS).map(|_| [sample(), sample()]).collect();
        Self {
            radius,
            seed,
            sigma: 2.0,
            pattern,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius as u32
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn describe(&self, smoothed: &GrayImage, keypoint: &KeyPoint) -> Option<Descriptor> {
        let (x, y) = keypoint.pixel()?;
        let (x, y) = (x as i32, y as i32);
        let margin = self.radius + 1;
        let (width, height) = (smoothed.width() as i32, smoothed.height() as i32);
        if x < margin || y < margin || x + margin >= width || y + margin >= height {
            return None;
        }
        let (sin, cos) = keypoint.angle.sin_cos();
        let sample = |(dx, dy): (f32, f32)| {
            let rx = (cos * dx - sin * dy).round() as i32;
            let ry = (sin * dx + cos * dy).round() as i32;
            smoothed.get_pixel((x + rx) as u32, (y + ry) as u32)[0]
        };
        let mut descriptor = BitArray::zeros();
        for (bit, &[a, b]) in self.pattern.iter().enumerate() {
            if sample(a) < sample(b) {
                descriptor.bytes_mut()[bit / 8] |= 1 << (bit % 8);
            }
        }
        Some(descriptor)
    }
}

impl Default for BriefExtractor {
    fn default() -> Self {
        Self::new(15, 0)
    }
}

impl DescriptorExtractor for BriefExtractor {
    fn name(&self) -> &str {
        "BRIEF"
    }

    fn compute(
        &self,
        image: &DynamicImage,
        keypoints: Vec<KeyPoint>,
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        if keypoints.is_empty() {
            return (vec![], vec![]);
        }
        let smoothed = gaussian_blur_f32(&image.to_luma8(), self.sigma);
        let requested = keypoints.len();
        let described: (Vec<KeyPoint>, Vec<Descriptor>) = keypoints
            .into_iter()
            .filter_map(|keypoint| {
                self.describe(&smoothed, &keypoint)
                    .map(|descriptor| (keypoint, descriptor))
            })
            .unzip();
        trace!(
            "BRIEF described {} of {} keypoints",
            described.0.len(),
            requested
        );
        described
    }
}
