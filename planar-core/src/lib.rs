//! # Planar Core
//!
//! This library provides the common vocabulary shared by the crates of the planar detection
//! workspace: keypoints, binary descriptors, descriptor matches, point correspondences and
//! the [`Homography`] that relates two views of a plane. It is intentionally small so that
//! estimator crates (like `four-point`) can depend on it without pulling in image decoding or
//! feature extraction.
//!
//! ## Conventions
//!
//! A [`Homography`] is a 3x3 projective transform acting on homogeneous pixel coordinates.
//! Every homography produced by this workspace is normalized so that its bottom-right element
//! is exactly `1.0`, see [`Homography::normalized`].
//!
//! A [`FeatureMatch`] is always ordered `(source, target)`. When a homography is estimated
//! from a set of feature matches, it maps the source points onto the target points. The same
//! ordering is used by [`find_inliers`], which is not symmetric: swapping the point lists
//! requires passing the inverse homography.
//!
//! ```text
//!   source frame               target frame
//!   +-----------+      H       +-----------+
//!   |   a       |  --------->  |      b    |
//!   +-----------+              +-----------+
//!        FeatureMatch(a, b), residual = |H(a) - b|
//! ```

mod homography;
mod keypoint;
mod matches;

pub use bitarray;
pub use homography::*;
pub use keypoint::*;
pub use matches::*;
pub use nalgebra;
pub use sample_consensus;
