use crate::{
    AkazeDetector, AkazeExtractor, BriefExtractor, BruteForceHamming, Error, FastDetector, Result,
};
use akaze::Akaze;
use image::{DynamicImage, GrayImage};
use planar_core::{Descriptor, DescriptorMatch, KeyPoint};
use std::fmt;
use std::sync::Arc;

/// Finds keypoints in an image.
pub trait FeatureDetector: Send + Sync {
    /// A short identifier such as `"FAST"`, used for logging.
    fn name(&self) -> &str;

    /// Detects keypoints, keeping only those whose pixel is non-zero in `mask` when one is given.
    fn detect(&self, image: &DynamicImage, mask: Option<&GrayImage>) -> Vec<KeyPoint>;

    /// The AKAZE configuration, when this detector is AKAZE.
    fn akaze(&self) -> Option<&Akaze> {
        None
    }
}

/// Computes a descriptor for each keypoint.
pub trait DescriptorExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Describes `keypoints` in `image`.
    ///
    /// Keypoints that cannot be described (too close to the border, for example) are dropped.
    /// The returned keypoints and descriptors are row aligned.
    fn compute(&self, image: &DynamicImage, keypoints: Vec<KeyPoint>) -> (Vec<KeyPoint>, Vec<Descriptor>);

    /// Whether keypoints found by `detector` can be described by this extractor.
    fn supports(&self, _detector: &dyn FeatureDetector) -> bool {
        true
    }

    /// Detects keypoints with `detector` and describes them.
    ///
    /// Extractors that share a pipeline with their detector override this to run it once.
    fn detect_and_compute(
        &self,
        detector: &dyn FeatureDetector,
        image: &DynamicImage,
        mask: Option<&GrayImage>,
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        let keypoints = detector.detect(image, mask);
        self.compute(image, keypoints)
    }
}

/// Creates search indices over collections of descriptors.
pub trait DescriptorMatcher: Send + Sync {
    fn name(&self) -> &str;

    /// Builds an immutable index over `collections`.
    ///
    /// Matches found in the index report the position of their collection as
    /// [`DescriptorMatch::image`] and the position inside it as [`DescriptorMatch::train`].
    fn train(&self, collections: Vec<Vec<Descriptor>>) -> Box<dyn DescriptorIndex>;
}

/// A trained descriptor index.
pub trait DescriptorIndex: Send + Sync {
    /// The best match for every query descriptor that has one.
    fn best_matches(&self, queries: &[Descriptor]) -> Vec<DescriptorMatch>;

    /// The number of indexed descriptors across all collections.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The bundle of feature detection, description and matching capabilities.
///
/// A `Feature` is immutable configuration. Cloning it shares the capabilities, which is safe
/// because none of them carry state; a trained index lives in whoever called
/// [`DescriptorMatcher::train`].
#[derive(Clone)]
pub struct Feature {
    pub detector: Arc<dyn FeatureDetector>,
    pub extractor: Arc<dyn DescriptorExtractor>,
    pub matcher: Arc<dyn DescriptorMatcher>,
}

impl Feature {
    pub fn new(
        detector: impl FeatureDetector + 'static,
        extractor: impl DescriptorExtractor + 'static,
        matcher: impl DescriptorMatcher + 'static,
    ) -> Self {
        Self {
            detector: Arc::new(detector),
            extractor: Arc::new(extractor),
            matcher: Arc::new(matcher),
        }
    }

    pub fn builder() -> FeatureBuilder {
        FeatureBuilder::default()
    }

    /// Resolves the three capabilities by name, with their default configuration.
    ///
    /// Detectors: `"AKAZE"`, `"FAST"`. Extractors: `"AKAZE"`, `"BRIEF"`.
    /// Matchers: `"BruteForce-Hamming"`.
    ///
    /// AKAZE descriptors only exist for AKAZE keypoints, so the `"AKAZE"` extractor requires the
    /// `"AKAZE"` detector. Any other pairing fails with [`Error::IncompatibleCapabilities`].
    pub fn from_names(detector: &str, extractor: &str, matcher: &str) -> Result<Self> {
        Self::builder()
            .detector_arc(detector_by_name(detector)?)
            .extractor_arc(extractor_by_name(extractor)?)
            .matcher_arc(matcher_by_name(matcher)?)
            .build()
    }

    /// Detects keypoints (optionally restricted to `mask`) and describes them.
    pub fn detect_and_compute(
        &self,
        image: &DynamicImage,
        mask: Option<&GrayImage>,
    ) -> (Vec<KeyPoint>, Vec<Descriptor>) {
        self.extractor
            .detect_and_compute(self.detector.as_ref(), image, mask)
    }
}

impl Default for Feature {
    /// AKAZE keypoints with AKAZE descriptors and brute-force Hamming matching.
    fn default() -> Self {
        Self::new(
            AkazeDetector::default(),
            AkazeExtractor::default(),
            BruteForceHamming::default(),
        )
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("detector", &self.detector.name())
            .field("extractor", &self.extractor.name())
            .field("matcher", &self.matcher.name())
            .finish()
    }
}

fn detector_by_name(name: &str) -> Result<Arc<dyn FeatureDetector>> {
    match name {
        "AKAZE" => Ok(Arc::new(AkazeDetector::default())),
        "FAST" => Ok(Arc::new(FastDetector::default())),
        _ => Err(Error::UnknownCapability {
            kind: "feature detector",
            name: name.to_owned(),
        }),
    }
}

fn extractor_by_name(name: &str) -> Result<Arc<dyn DescriptorExtractor>> {
    match name {
        "AKAZE" => Ok(Arc::new(AkazeExtractor::default())),
        "BRIEF" => Ok(Arc::new(BriefExtractor::default())),
        _ => Err(Error::UnknownCapability {
            kind: "descriptor extractor",
            name: name.to_owned(),
        }),
    }
}

fn matcher_by_name(name: &str) -> Result<Arc<dyn DescriptorMatcher>> {
    match name {
        "BruteForce-Hamming" | "BruteForce-Hamming(2)" => Ok(Arc::new(BruteForceHamming::default())),
        _ => Err(Error::UnknownCapability {
            kind: "descriptor matcher",
            name: name.to_owned(),
        }),
    }
}

/// Assembles a [`Feature`] from already built capabilities.
///
/// [`FeatureBuilder::build`] fails if any of the three capabilities was not supplied.
#[derive(Default, Clone)]
pub struct FeatureBuilder {
    detector: Option<Arc<dyn FeatureDetector>>,
    extractor: Option<Arc<dyn DescriptorExtractor>>,
    matcher: Option<Arc<dyn DescriptorMatcher>>,
}

impl FeatureBuilder {
    pub fn detector(self, detector: impl FeatureDetector + 'static) -> Self {
        self.detector_arc(Arc::new(detector))
    }

    pub fn extractor(self, extractor: impl DescriptorExtractor + 'static) -> Self {
        self.extractor_arc(Arc::new(extractor))
    }

    pub fn matcher(self, matcher: impl DescriptorMatcher + 'static) -> Self {
        self.matcher_arc(Arc::new(matcher))
    }

    pub fn detector_arc(mut self, detector: Arc<dyn FeatureDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn extractor_arc(mut self, extractor: Arc<dyn DescriptorExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn matcher_arc(mut self, matcher: Arc<dyn DescriptorMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn build(self) -> Result<Feature> {
        let detector = self
            .detector
            .ok_or(Error::MissingCapability("feature detector"))?;
        let extractor = self
            .extractor
            .ok_or(Error::MissingCapability("descriptor extractor"))?;
        let matcher = self
            .matcher
            .ok_or(Error::MissingCapability("descriptor matcher"))?;
        if !extractor.supports(detector.as_ref()) {
            return Err(Error::IncompatibleCapabilities {
                detector: detector.name().to_owned(),
                extractor: extractor.name().to_owned(),
            });
        }
        Ok(Feature {
            detector,
            extractor,
            matcher,
        })
    }
}
