//! # Planar Find
//!
//! Detects known planar objects (posters, book covers, boxes) in images.
//!
//! Each object is a [`PlanarModel`] made of one or more calibrated [`PlanarView`]s. The features
//! of all views are pooled in the frame of the model's reference view. A [`Detector`] indexes
//! the pooled descriptors of every model in a [`Modelbase`] at once, matches the features of a
//! query image against that single index, attributes every match to the model it landed in
//! and fits a homography per model. A [`DetectionFilter`] then decides which of the fitted
//! candidates are accepted.
//!
//! ```no_run
//! use planar_find::{DetectionFilter, Detector, Feature, Modelbase};
//!
//! let feature = Feature::default();
//! let mut modelbase = Modelbase::new(feature.clone());
//! modelbase.add_path("models/poster").unwrap();
//!
//! let filter = DetectionFilter::eigenvalue(1.0 / 3.0, 3.0) & DetectionFilter::inliers_ratio(0.15);
//! let detector = Detector::new(modelbase, feature, filter);
//! let scene = detector.describe(image::open("scene.jpg").unwrap()).unwrap();
//! for detection in detector.detect(&scene) {
//!     println!("found {} with {} inliers", detection.model.name(), detection.inliers.len());
//! }
//! ```
//!
//! ## Modules
//! * [`storage`] - homography and color documents
//! * [`provide`] - image sources
//!
//! Feature detection, description and matching are pluggable through the [`FeatureDetector`],
//! [`DescriptorExtractor`] and [`DescriptorMatcher`] traits. AKAZE, FAST, BRIEF and brute force
//! Hamming matching are provided.

mod consensus;
mod detect;
mod detectors;
mod error;
mod extractors;
mod feature;
mod filter;
mod matcher;
mod model;
pub mod provide;
mod sequence;
mod settings;
pub mod storage;

pub use consensus::robust_homography;
pub use detect::*;
pub use detectors::*;
pub use error::*;
pub use extractors::*;
pub use feature::*;
pub use filter::*;
pub use matcher::*;
pub use model::*;
pub use planar_core;
pub use sequence::*;
pub use settings::*;
