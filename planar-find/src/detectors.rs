use crate::FeatureDetector;
use akaze::Akaze;
use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::corners::corners_fast9;
use log::*;
use planar_core::KeyPoint;

/// Radius of the patch used for the intensity centroid orientation of FAST corners.
const ORIENTATION_RADIUS: i32 = 15;

/// Whether `keypoint` lies on a non-zero pixel of `mask`.
///
/// Without a mask every keypoint is allowed. Keypoints outside the mask bounds are rejected.
pub fn mask_allows(mask: Option<&GrayImage>, keypoint: &KeyPoint) -> bool {
    let mask = match mask {
        Some(mask) => mask,
        None => return true,
    };
    match keypoint.pixel() {
        Some((x, y)) if x < mask.width() && y < mask.height() => mask.get_pixel(x, y)[0] != 0,
        _ => false,
    }
}

pub(crate) fn from_akaze(keypoint: &akaze::KeyPoint) -> KeyPoint {
    KeyPoint {
        size: keypoint.size,
        angle: keypoint.angle,
        response: keypoint.response,
        octave: keypoint.octave,
        class_id: keypoint.class_id,
        ..KeyPoint::new(keypoint.point.0 as f64, keypoint.point.1 as f64)
    }
}

/// Detects AKAZE keypoints in nonlinear scale space.
#[derive(Debug, Clone, Copy, Default)]
pub struct AkazeDetector {
    pub akaze: Akaze,
}

impl AkazeDetector {
    /// Uses the given detector response threshold, see [`Akaze::new`].
    pub fn new(threshold: f64) -> Self {
        Self {
            akaze: Akaze::new(threshold),
        }
    }
}

impl FeatureDetector for AkazeDetector {
    fn name(&self) -> &str {
        "AKAZE"
    }

    fn detect(&self, image: &DynamicImage, mask: Option<&GrayImage>) -> Vec<KeyPoint> {
        if image.width() == 0 || image.height() == 0 {
            return vec![];
        }
        let (keypoints, _) = self.akaze.extract(image);
        let keypoints: Vec<KeyPoint> = keypoints
            .iter()
            .map(from_akaze)
            .filter(|keypoint| mask_allows(mask, keypoint))
            .collect();
        debug!("AKAZE detected {} keypoints", keypoints.len());
        keypoints
    }

    fn akaze(&self) -> Option<&Akaze> {
        Some(&self.akaze)
    }
}

/// Detects FAST-9 corners and orients them by their intensity centroid.
///
/// Corners are ranked by their FAST score and at most `max_keypoints` of them are kept.
#[derive(Debug, Clone, Copy)]
pub struct FastDetector {
    /// Minimum intensity difference between the center and the contiguous arc of the circle.
    pub threshold: u8,
    pub max_keypoints: usize,
}

impl Default for FastDetector {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_keypoints: 1500,
        }
    }
}

impl FastDetector {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }
}

impl FeatureDetector for FastDetector {
    fn name(&self) -> &str {
        "FAST"
    }

    fn detect(&self, image: &DynamicImage, mask: Option<&GrayImage>) -> Vec<KeyPoint> {
        let gray = image.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return vec![];
        }
        let mut corners = corners_fast9(&gray, self.threshold);
        corners.sort_by(|a, b| b.score.total_cmp(&a.score));
        let keypoints: Vec<KeyPoint> = corners
            .iter()
            .map(|corner| KeyPoint {
                size: (2 * ORIENTATION_RADIUS + 1) as f32,
                angle: intensity_centroid_angle(&gray, corner.x as i32, corner.y as i32),
                response: corner.score,
                ..KeyPoint::new(corner.x as f64, corner.y as f64)
            })
            .filter(|keypoint| mask_allows(mask, keypoint))
            .take(self.max_keypoints)
            .collect();
        debug!(
            "FAST kept {} of {} corners",
            keypoints.len(),
            corners.len()
        );
        keypoints
    }
}

/// The angle from `(cx, cy)` to the intensity centroid of the surrounding disc.
///
/// Pixels of the disc that fall outside the image are skipped.
fn intensity_centroid_angle(image: &GrayImage, cx: i32, cy: i32) -> f32 {
    let (width, height) = (image.width() as i32, image.height() as i32);
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > ORIENTATION_RADIUS * ORIENTATION_RADIUS {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let intensity = image.get_pixel(x as u32, y as u32)[0] as f32;
            m10 += dx as f32 * intensity;
            m01 += dy as f32 * intensity;
        }
    }
    m01.atan2(m10)
}
