use bitarray::BitArray;
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A 512-bit binary descriptor compared with the Hamming distance.
///
/// Every detector and extractor in the workspace produces this descriptor type, which is what
/// allows arbitrary detector/extractor combinations to be matched against each other.
pub type Descriptor = BitArray<64>;

/// A point of interest in an image.
///
/// This follows the OpenCV conventions: `+x` faces right, `+y` faces down and the origin is the
/// top left corner of the image, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint {
    /// Location of the keypoint in pixel coordinates.
    pub point: Point2<f64>,
    /// The diameter of the meaningful neighborhood, in pixel units.
    pub size: f32,
    /// The orientation angle in radians.
    pub angle: f32,
    /// The magnitude of response from the detector.
    pub response: f32,
    /// The level of scale space in which the keypoint was detected.
    pub octave: usize,
    /// A classification ID
    pub class_id: usize,
}

impl KeyPoint {
    /// Creates a keypoint at `(x, y)` with every other attribute zeroed.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point2::new(x, y),
            size: 0.0,
            angle: 0.0,
            response: 0.0,
            octave: 0,
            class_id: 0,
        }
    }

    /// Returns a copy of this keypoint moved to `point`.
    ///
    /// Scale, orientation, response and the remaining metadata are carried over unchanged.
    pub fn with_point(&self, point: Point2<f64>) -> Self {
        Self { point, ..*self }
    }

    /// The pixel containing this keypoint, if it has non-negative coordinates.
    pub fn pixel(&self) -> Option<(u32, u32)> {
        let x = self.point.x.round();
        let y = self.point.y.round();
        if x >= 0.0 && y >= 0.0 && x <= u32::MAX as f64 && y <= u32::MAX as f64 {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }
}
