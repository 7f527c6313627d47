use crate::{consensus::robust_homography, DetectorSettings, Error, Feature, Result};
use image::{DynamicImage, GenericImageView};
use log::*;
use planar_core::{nalgebra::Point2, Homography};

/// Estimates the homography mapping coordinates of `image1` into `image2`.
///
/// The features of `image1` are matched against those of `image2` and the homography is fit
/// robustly. Fails if fewer than four matches are found or if no model reaches consensus.
pub fn estimate_homography(
    image1: &DynamicImage,
    image2: &DynamicImage,
    feature: &Feature,
    settings: &DetectorSettings,
) -> Result<Homography> {
    for image in [image1, image2] {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage);
        }
    }
    let (keypoints1, descriptors1) = feature.detect_and_compute(image1, None);
    let (keypoints2, descriptors2) = feature.detect_and_compute(image2, None);
    let index = feature.matcher.train(vec![descriptors2]);
    let (sources, targets): (Vec<Point2<f64>>, Vec<Point2<f64>>) = index
        .best_matches(&descriptors1)
        .iter()
        .map(|m| (keypoints1[m.query].point, keypoints2[m.train].point))
        .unzip();
    if sources.len() < 4 {
        return Err(Error::NotEnoughMatches(sources.len()));
    }
    robust_homography(&sources, &targets, settings).ok_or(Error::EstimationFailed)
}

/// The position of a frame in an image sequence.
#[derive(Debug, Clone)]
pub struct SequenceState {
    /// The most recent frame.
    pub previous_image: DynamicImage,
    /// Maps coordinates of the first frame into the most recent frame.
    pub homography: Homography,
}

/// Chains pairwise homographies along an image sequence.
///
/// The state is threaded through by the caller, one frame at a time and in playback order:
///
/// ```no_run
/// # fn frames() -> Vec<image::DynamicImage> { vec![] }
/// use planar_find::HomographySequenceEstimator;
///
/// let estimator = HomographySequenceEstimator::default();
/// let mut frames = frames().into_iter();
/// let mut state = estimator.first(frames.next().unwrap());
/// for frame in frames {
///     state = estimator.next(&state, frame).unwrap();
///     println!("{:?}", state.homography);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HomographySequenceEstimator {
    pub feature: Feature,
    pub settings: DetectorSettings,
}

impl HomographySequenceEstimator {
    pub fn new(feature: Feature, settings: DetectorSettings) -> Self {
        Self { feature, settings }
    }

    /// Starts a sequence; the first frame is related to itself by the identity.
    pub fn first(&self, image: DynamicImage) -> SequenceState {
        SequenceState {
            previous_image: image,
            homography: Homography::identity(),
        }
    }

    /// Advances the sequence by one frame.
    pub fn next(&self, state: &SequenceState, image: DynamicImage) -> Result<SequenceState> {
        let pairwise = estimate_homography(&state.previous_image, &image, &self.feature, &self.settings)?;
        let homography = (pairwise * state.homography)
            .normalized()
            .ok_or(Error::EstimationFailed)?;
        trace!("sequence homography {:?}", homography.to_row_array());
        Ok(SequenceState {
            previous_image: image,
            homography,
        })
    }
}
