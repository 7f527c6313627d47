use crate::DetectorSettings;
use arrsac::Arrsac;
use four_point::FourPoint;
use log::*;
use planar_core::{
    nalgebra::Point2,
    sample_consensus::{Consensus, Estimator},
    FeatureMatch, Homography,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Robustly fits the homography mapping `sources` onto `targets`.
///
/// ARRSAC finds the consensus set with the four point estimator, then the homography is refit
/// over all of its inliers. Returns `None` with fewer than four correspondences or when no
/// model reaches consensus.
pub fn robust_homography(
    sources: &[Point2<f64>],
    targets: &[Point2<f64>],
    settings: &DetectorSettings,
) -> Option<Homography> {
    assert_eq!(sources.len(), targets.len());
    if sources.len() < FourPoint::MIN_SAMPLES {
        return None;
    }
    let matches: Vec<FeatureMatch> = sources
        .iter()
        .zip(targets)
        .map(|(&source, &target)| FeatureMatch(source, target))
        .collect();

    let estimator = FourPoint::new();
    let mut consensus = Arrsac::new(
        settings.reprojection_threshold,
        Xoshiro256PlusPlus::seed_from_u64(settings.consensus_seed),
    );
    let (homography, inliers) = consensus.model_inliers(&estimator, matches.iter().copied())?;
    trace!(
        "consensus kept {} of {} correspondences",
        inliers.len(),
        matches.len()
    );

    if inliers.len() > FourPoint::MIN_SAMPLES {
        if let Some(refined) = estimator.from_matches(inliers.iter().map(|&ix| matches[ix])) {
            return Some(refined);
        }
    }
    Some(homography)
}
