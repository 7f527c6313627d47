use approx::assert_relative_eq;
use arrsac::Arrsac;
use four_point::FourPoint;
use planar_core::nalgebra::Point2;
use planar_core::sample_consensus::{Consensus, Estimator};
use planar_core::{FeatureMatch, Homography};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

fn ground_truth() -> Homography {
    Homography::from_row_slice(&[
        0.92, -0.18, 35.0, 0.14, 1.07, -12.0, 0.0004, -0.0002, 1.0,
    ])
}

fn grid_matches(h: &Homography) -> Vec<FeatureMatch> {
    (0..10)
        .flat_map(|i| (0..8).map(move |j| Point2::new(20.0 + 45.0 * i as f64, 15.0 + 40.0 * j as f64)))
        .map(|p| FeatureMatch(p, h.transform_point(&p)))
        .collect()
}

#[test]
fn four_points_determine_the_homography() {
    let h = ground_truth();
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(640.0, 0.0),
        Point2::new(640.0, 480.0),
        Point2::new(0.0, 480.0),
    ];
    let matches = corners.iter().map(|&p| FeatureMatch(p, h.transform_point(&p)));
    let estimate = FourPoint::new().from_matches(matches).unwrap();
    assert_eq!(estimate[(2, 2)], 1.0);
    assert_relative_eq!(estimate.0, h.0, epsilon = 1e-6);
}

#[test]
fn estimator_yields_single_model() {
    let h = ground_truth();
    let matches = grid_matches(&h);
    let models: Vec<Homography> = FourPoint::new()
        .estimate(matches.iter().copied())
        .into_iter()
        .collect();
    assert_eq!(models.len(), 1);
    assert_relative_eq!(models[0].0, h.0, epsilon = 1e-6);
}

#[test]
fn too_few_distinct_points_yield_nothing() {
    let p = Point2::new(3.0, 4.0);
    let matches = [FeatureMatch(p, p); 4];
    assert!(FourPoint::new().from_matches(matches.iter().copied()).is_none());
}

#[test]
fn arrsac_rejects_outliers() {
    let h = ground_truth();
    let mut matches = grid_matches(&h);
    let inlier_count = matches.len();
    let mut rng = Pcg64::from_seed([3; 32]);
    for _ in 0..30 {
        let a = Point2::new(rng.gen_range(0.0..500.0), rng.gen_range(0.0..400.0));
        let b = Point2::new(rng.gen_range(0.0..500.0), rng.gen_range(0.0..400.0));
        matches.push(FeatureMatch(a, b));
    }

    let mut arrsac = Arrsac::new(1.0, Pcg64::from_seed([1; 32]));
    let (estimate, inliers) = arrsac
        .model_inliers(&FourPoint::new(), matches.iter().copied())
        .expect("failed to estimate model");

    assert!(estimate.distance(&h) < 1e-3);
    let inliers: Vec<usize> = inliers.into_iter().collect();
    assert!(inliers.len() >= inlier_count);
    assert!((0..inlier_count).all(|ix| inliers.contains(&ix)));
}
