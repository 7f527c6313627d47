use image::Rgba;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while building models, loading files or describing images.
///
/// Insufficient data for a homography fit during detection is deliberately not an error: such a
/// model simply has no detection in the scene.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("malformed json document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image has no pixels")]
    EmptyImage,
    #[error("required file {0:?} does not exist")]
    MissingFile(PathBuf),
    #[error("model color {0:?} is not fully opaque")]
    TransparentColor(Rgba<u8>),
    #[error("unknown {kind} {name:?}")]
    UnknownCapability { kind: &'static str, name: String },
    #[error("{0} not initialized")]
    MissingCapability(&'static str),
    #[error("{extractor} descriptors cannot describe {detector} keypoints")]
    IncompatibleCapabilities { detector: String, extractor: String },
    #[error("{keypoints} keypoints but {descriptors} descriptors")]
    MisalignedDescriptors { keypoints: usize, descriptors: usize },
    #[error("a planar model needs a reference view with the identity homography")]
    InvalidReference,
    #[error("homography is singular")]
    SingularHomography,
    #[error("malformed document {path:?}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },
    #[error("cannot estimate homography: too few matches ({0})")]
    NotEnoughMatches(usize),
    #[error("cannot estimate homography: consensus found no model")]
    EstimationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
