use crate::Detection;
use serde::{Deserialize, Serialize};
use std::ops::BitAnd;

/// The default minimum fraction of inliers among a detection's matches.
pub const DEFAULT_INLIERS_RATIO: f64 = 0.10;

/// Decides whether a candidate [`Detection`] is genuine.
///
/// Filters are plain values composed with `&`:
///
/// ```
/// use planar_find::DetectionFilter;
///
/// let filter = DetectionFilter::eigenvalue(1.0 / 3.0, 3.0) & DetectionFilter::inliers_ratio(0.15);
/// assert!(matches!(filter, DetectionFilter::And(_, _)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetectionFilter {
    /// Accepts every detection.
    AcceptAll,
    /// Accepts detections whose inliers make up at least `threshold` of their matches.
    ///
    /// A detection without matches is always rejected.
    InliersRatio {
        #[serde(default = "default_inliers_ratio")]
        threshold: f64,
    },
    /// Accepts detections whose homography scales the plane by a plausible amount.
    ///
    /// Both eigenvalues of the upper-left 2x2 block of the homography must lie in
    /// `[min, max]`, see [`planar_core::Homography::linear_eigenvalues`]. Missing bounds are
    /// unbounded.
    Eigenvalue {
        #[serde(default = "unbounded_below", skip_serializing_if = "is_unbounded")]
        min: f64,
        #[serde(default = "unbounded_above", skip_serializing_if = "is_unbounded")]
        max: f64,
    },
    /// Accepts detections that both filters accept.
    And(Box<DetectionFilter>, Box<DetectionFilter>),
}

impl DetectionFilter {
    pub fn inliers_ratio(threshold: f64) -> Self {
        Self::InliersRatio { threshold }
    }

    pub fn eigenvalue(min: f64, max: f64) -> Self {
        Self::Eigenvalue { min, max }
    }

    /// An eigenvalue filter bounded only from above.
    pub fn max_eigenvalue(max: f64) -> Self {
        Self::eigenvalue(unbounded_below(), max)
    }

    /// An eigenvalue filter bounded only from below.
    pub fn min_eigenvalue(min: f64) -> Self {
        Self::eigenvalue(min, unbounded_above())
    }

    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn accept(&self, detection: &Detection<'_>) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::InliersRatio { threshold } => {
                if detection.matches.is_empty() {
                    return false;
                }
                detection.inliers.len() as f64 / detection.matches.len() as f64 >= *threshold
            }
            Self::Eigenvalue { min, max } => detection
                .homography
                .linear_eigenvalues()
                .iter()
                .all(|eigenvalue| (*min..=*max).contains(eigenvalue)),
            Self::And(left, right) => left.accept(detection) && right.accept(detection),
        }
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::AcceptAll
    }
}

impl BitAnd for DetectionFilter {
    type Output = DetectionFilter;

    fn bitand(self, rhs: DetectionFilter) -> DetectionFilter {
        self.and(rhs)
    }
}

fn default_inliers_ratio() -> f64 {
    DEFAULT_INLIERS_RATIO
}

fn unbounded_below() -> f64 {
    f64::NEG_INFINITY
}

fn unbounded_above() -> f64 {
    f64::INFINITY
}

fn is_unbounded(bound: &f64) -> bool {
    bound.is_infinite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlanarModel, PlanarView, DEFAULT_COLOR};
    use image::{DynamicImage, GrayImage};
    use planar_core::{DescriptorMatch, Homography};
    use quickcheck_macros::quickcheck;

    fn model() -> PlanarModel {
        let view = PlanarView::new(
            DynamicImage::new_luma8(8, 8),
            GrayImage::new(8, 8),
            Homography::identity(),
            vec![],
            vec![],
        )
        .unwrap();
        PlanarModel::new("box", DEFAULT_COLOR, vec![view]).unwrap()
    }

    fn detection(model: &PlanarModel, homography: Homography, matches: usize, inliers: usize) -> Detection<'_> {
        Detection {
            model,
            model_index: 0,
            homography,
            matches: (0..matches)
                .map(|query| DescriptorMatch {
                    query,
                    train: query,
                    image: 0,
                    distance: 0,
                })
                .collect(),
            inliers: (0..inliers).collect(),
        }
    }

    fn scaled(sx: f64, sy: f64) -> Homography {
        Homography::from_row_slice(&[sx, 0.0, 12.0, 0.0, sy, -3.0, 0.0, 0.0, 1.0])
    }

    #[test]
    fn accept_all_accepts_empty_detection() {
        let model = model();
        assert!(DetectionFilter::AcceptAll.accept(&detection(&model, Homography::identity(), 0, 0)));
    }

    #[test]
    fn inliers_ratio_rejects_without_matches() {
        let model = model();
        let empty = detection(&model, Homography::identity(), 0, 0);
        assert!(!DetectionFilter::inliers_ratio(0.0).accept(&empty));
        assert!(!DetectionFilter::inliers_ratio(-1.0).accept(&empty));
    }

    #[test]
    fn inliers_ratio_threshold_is_inclusive() {
        let model = model();
        let filter = DetectionFilter::inliers_ratio(DEFAULT_INLIERS_RATIO);
        assert!(filter.accept(&detection(&model, Homography::identity(), 20, 2)));
        assert!(!filter.accept(&detection(&model, Homography::identity(), 20, 1)));
    }

    #[test]
    fn eigenvalue_bounds() {
        let model = model();
        let check = |min: f64, max: f64, h: Homography| {
            DetectionFilter::eigenvalue(min, max).accept(&detection(&model, h, 10, 10))
        };
        assert!(!check(0.5, 3.0, scaled(2.0, 0.4)));
        assert!(check(1.0 / 3.0, 3.0, scaled(2.0, 0.4)));
        assert!(!check(1.0 / 3.0, 1.5, scaled(2.0, 0.4)));
        assert!(check(1.0 / 3.0, 3.0, scaled(2.9, 2.9)));
        assert!(!check(1.0 / 3.0, 3.0, scaled(4.0, 4.0)));
    }

    #[test]
    fn and_requires_both() {
        let model = model();
        let filter = DetectionFilter::eigenvalue(1.0 / 3.0, 3.0) & DetectionFilter::inliers_ratio(0.5);
        assert!(filter.accept(&detection(&model, scaled(1.2, 0.9), 10, 6)));
        assert!(!filter.accept(&detection(&model, scaled(1.2, 0.9), 10, 4)));
        assert!(!filter.accept(&detection(&model, scaled(4.0, 0.9), 10, 6)));
    }

    #[test]
    fn deserializes_with_defaults() {
        let filter: DetectionFilter =
            serde_json::from_str(r#"{"And": [{"InliersRatio": {}}, {"Eigenvalue": {"max": 3.0}}]}"#).unwrap();
        assert_eq!(
            filter,
            DetectionFilter::inliers_ratio(0.10) & DetectionFilter::max_eigenvalue(3.0)
        );
        let json = serde_json::to_string(&filter).unwrap();
        let back: DetectionFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filter);
        let accept: DetectionFilter = serde_json::from_str(r#""AcceptAll""#).unwrap();
        assert_eq!(accept, DetectionFilter::default());
    }

    #[test]
    fn one_sided_eigenvalue_bounds() {
        let model = model();
        let shrunk = detection(&model, scaled(0.01, 0.02), 10, 10);
        let grown = detection(&model, scaled(50.0, 40.0), 10, 10);
        assert!(DetectionFilter::max_eigenvalue(3.0).accept(&shrunk));
        assert!(!DetectionFilter::max_eigenvalue(3.0).accept(&grown));
        assert!(DetectionFilter::min_eigenvalue(1.0 / 3.0).accept(&grown));
        assert!(!DetectionFilter::min_eigenvalue(1.0 / 3.0).accept(&shrunk));
        assert_eq!(
            serde_json::to_string(&DetectionFilter::max_eigenvalue(3.0)).unwrap(),
            r#"{"Eigenvalue":{"max":3.0}}"#
        );
    }

    #[quickcheck]
    fn inliers_ratio_never_accepts_empty_matches(threshold: f64) -> bool {
        let model = model();
        !DetectionFilter::inliers_ratio(threshold).accept(&detection(&model, Homography::identity(), 0, 0))
    }

    #[quickcheck]
    fn inliers_ratio_agrees_with_fraction(matches: u8, inliers: u8, percent: u8) -> bool {
        let matches = matches as usize + 1;
        let inliers = inliers as usize % (matches + 1);
        let threshold = percent as f64 / 255.0;
        let model = model();
        let accepted = DetectionFilter::inliers_ratio(threshold)
            .accept(&detection(&model, Homography::identity(), matches, inliers));
        accepted == (inliers as f64 / matches as f64 >= threshold)
    }
}
