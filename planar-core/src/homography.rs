use crate::{FeatureMatch, KeyPoint};
use core::ops::Mul;
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3, Point2, Vector3};
use sample_consensus::Model;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The default maximum reprojection distance, in pixels, for a correspondence to be an inlier.
pub const DEFAULT_REPROJECTION_THRESHOLD: f64 = 3.0;

/// A 3x3 projective transform between two image frames of the same plane.
///
/// Homographies act on homogeneous pixel coordinates. Composition follows matrix
/// multiplication, so `(b * a)` first applies `a` and then `b`.
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    /// The identity transform.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// A pure translation by `(dx, dy)` pixels.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0))
    }

    /// Builds a homography from its nine elements in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `elements` does not hold exactly nine values.
    pub fn from_row_slice(elements: &[f64]) -> Self {
        Self(Matrix3::from_row_slice(elements))
    }

    /// The nine elements in row-major order.
    pub fn to_row_array(&self) -> [f64; 9] {
        let m = &self.0;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    /// Scales the matrix so that its bottom-right element is exactly `1.0`.
    ///
    /// Returns `None` if that element is zero (or not finite), in which case the transform
    /// cannot be brought into this form.
    pub fn normalized(&self) -> Option<Self> {
        let w = self.0[(2, 2)];
        if !w.is_finite() || w.abs() < f64::EPSILON {
            return None;
        }
        // Element-wise division keeps the (2, 2) entry at exactly 1.0.
        Some(Self(self.0.map(|x| x / w)))
    }

    /// The inverse transform, normalized with [`Homography::normalized`].
    ///
    /// Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().and_then(|m| Self(m).normalized())
    }

    /// Maps a point through the transform, including the perspective division.
    ///
    /// Points that map to infinity produce non-finite coordinates.
    pub fn transform_point(&self, point: &Point2<f64>) -> Point2<f64> {
        let p = self.0 * Vector3::new(point.x, point.y, 1.0);
        Point2::new(p.x / p.z, p.y / p.z)
    }

    /// Eigenvalues of the upper-left 2x2 block, which governs scale and shear.
    ///
    /// Translation and perspective terms are ignored. When the block has a complex conjugate
    /// pair of eigenvalues (it contains a rotation), both entries hold their common modulus.
    /// Real eigenvalues are returned largest first.
    pub fn linear_eigenvalues(&self) -> [f64; 2] {
        let m = &self.0;
        let (a, b, c, d) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        let half_trace = 0.5 * (a + d);
        let determinant = a * d - b * c;
        let discriminant = half_trace * half_trace - determinant;
        if discriminant >= 0.0 {
            let root = discriminant.sqrt();
            [half_trace + root, half_trace - root]
        } else {
            let modulus = determinant.sqrt();
            [modulus, modulus]
        }
    }

    /// The Frobenius norm of the element-wise difference between two homographies.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.0 - other.0).norm()
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Homography {
    type Output = Homography;

    fn mul(self, rhs: Homography) -> Homography {
        Homography(self.0 * rhs.0)
    }
}

impl Model<FeatureMatch> for Homography {
    /// The reprojection error in pixels of the source point against the target point.
    fn residual(&self, data: &FeatureMatch) -> f64 {
        let &FeatureMatch(source, target) = data;
        (self.transform_point(&source) - target).norm()
    }
}

/// Applies `transform` to the location of every keypoint.
///
/// Scale, orientation, response and the remaining attributes are preserved, and the output
/// order matches the input order.
pub fn perspective_transform_keypoints(keypoints: &[KeyPoint], transform: &Homography) -> Vec<KeyPoint> {
    keypoints
        .iter()
        .map(|keypoint| keypoint.with_point(transform.transform_point(&keypoint.point)))
        .collect()
}

/// Indices `i` where `homography` maps `sources[i]` within `threshold` pixels of `targets[i]`.
///
/// The homography must map the frame of `sources` into the frame of `targets`. Swapping the
/// point lists without inverting the homography produces a different inlier set.
///
/// # Panics
///
/// Panics if the two point lists have different lengths.
pub fn find_inliers(
    sources: &[Point2<f64>],
    targets: &[Point2<f64>],
    homography: &Homography,
    threshold: f64,
) -> Vec<usize> {
    assert_eq!(
        sources.len(),
        targets.len(),
        "point lists of a correspondence set must have equal length"
    );
    sources
        .iter()
        .zip(targets)
        .enumerate()
        .filter(|(_, (source, target))| {
            (homography.transform_point(source) - **target).norm() <= threshold
        })
        .map(|(ix, _)| ix)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn inverse_is_normalized() {
        let h = Homography::from_row_slice(&[2.0, 0.1, 5.0, -0.2, 1.5, 3.0, 0.001, 0.002, 2.0]);
        let inverse = h.inverse().unwrap();
        assert_eq!(inverse[(2, 2)], 1.0);
        let round_trip = inverse.inverse().unwrap();
        assert_relative_eq!(round_trip.0, h.normalized().unwrap().0, epsilon = 1e-9);
    }

    #[test]
    fn singular_has_no_inverse() {
        let h = Homography::from_row_slice(&[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert!(h.inverse().is_none());
    }

    #[test]
    fn translation_moves_points() {
        let h = Homography::translation(110.0, -4.0);
        let p = h.transform_point(&Point2::new(1.0, 2.0));
        assert_relative_eq!(p, Point2::new(111.0, -2.0));
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let scale = Homography::from_row_slice(&[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        let shift = Homography::translation(1.0, 0.0);
        let p = (scale * shift).transform_point(&Point2::new(1.0, 1.0));
        assert_relative_eq!(p, Point2::new(4.0, 2.0));
    }

    #[test]
    fn eigenvalues_of_diagonal_block() {
        let h = Homography::from_row_slice(&[2.0, 0.0, 6.0, 0.0, 0.4, 2.0, 0.0, 0.0, 1.0]);
        let [a, b] = h.linear_eigenvalues();
        assert_relative_eq!(a, 2.0, epsilon = 1e-12);
        assert_relative_eq!(b, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn eigenvalues_of_rotation_use_modulus() {
        let (s, c) = 0.7f64.sin_cos();
        let h = Homography::from_row_slice(&[1.5 * c, -1.5 * s, 0.0, 1.5 * s, 1.5 * c, 0.0, 0.0, 0.0, 1.0]);
        let [a, b] = h.linear_eigenvalues();
        assert_relative_eq!(a, 1.5, epsilon = 1e-12);
        assert_relative_eq!(b, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn residual_is_reprojection_distance() {
        let h = Homography::translation(3.0, 4.0);
        let data = FeatureMatch(Point2::new(0.0, 0.0), Point2::new(0.0, 0.0));
        assert_relative_eq!(h.residual(&data), 5.0);
    }

    #[test]
    fn keypoints_transform_back_and_forth() {
        let h = Homography::from_row_slice(&[
            0.81, -0.12, 14.0, 0.09, 0.93, -6.5, 0.0002, -0.0001, 1.0,
        ]);
        let keypoints: Vec<KeyPoint> = (0..50)
            .map(|i| KeyPoint {
                angle: i as f32 * 0.1,
                ..KeyPoint::new(3.0 * i as f64, 400.0 - 7.0 * i as f64)
            })
            .collect();
        let there = perspective_transform_keypoints(&keypoints, &h);
        let back = perspective_transform_keypoints(&there, &h.inverse().unwrap());
        for (original, recovered) in keypoints.iter().zip(&back) {
            assert_relative_eq!(original.point, recovered.point, epsilon = 1e-4);
            assert_eq!(original.angle, recovered.angle);
        }
    }

    #[test]
    #[should_panic]
    fn find_inliers_rejects_mismatched_lengths() {
        find_inliers(
            &[Point2::origin()],
            &[],
            &Homography::identity(),
            DEFAULT_REPROJECTION_THRESHOLD,
        );
    }
}
