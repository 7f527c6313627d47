use crate::{
    consensus::robust_homography, DescriptorIndex, DetectionFilter, DetectorSettings, Error,
    Feature, Modelbase, PlanarModel, Result,
};
use image::{DynamicImage, GenericImageView};
use log::*;
use planar_core::{find_inliers, nalgebra::Point2, Descriptor, DescriptorMatch, Homography, KeyPoint};

/// The features of one query image.
#[derive(Debug, Clone)]
pub struct Scene {
    pub image: DynamicImage,
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Vec<Descriptor>,
}

/// A model found in a [`Scene`].
#[derive(Debug, Clone)]
pub struct Detection<'a> {
    pub model: &'a PlanarModel,
    /// The position of `model` in the detector's modelbase.
    pub model_index: usize,
    /// Maps the reference frame of the model into the scene.
    pub homography: Homography,
    /// The scene matches that landed in this model's descriptors.
    ///
    /// `query` indexes the scene keypoints and `train` the pooled model keypoints.
    pub matches: Vec<DescriptorMatch>,
    /// Indices into `matches` that agree with `homography`.
    pub inliers: Vec<usize>,
}

/// Finds the models of a [`Modelbase`] in query images.
///
/// The descriptors of all models are indexed once on construction. Adding models afterwards
/// requires a new detector.
pub struct Detector {
    modelbase: Modelbase,
    feature: Feature,
    filter: DetectionFilter,
    settings: DetectorSettings,
    index: Box<dyn DescriptorIndex>,
}

impl Detector {
    pub fn new(modelbase: Modelbase, feature: Feature, filter: DetectionFilter) -> Self {
        Self::with_settings(modelbase, feature, filter, DetectorSettings::default())
    }

    pub fn with_settings(
        modelbase: Modelbase,
        feature: Feature,
        filter: DetectionFilter,
        settings: DetectorSettings,
    ) -> Self {
        let collections = modelbase
            .models()
            .iter()
            .map(|model| model.descriptors().to_vec())
            .collect();
        let index = feature.matcher.train(collections);
        info!(
            "detector indexed {} descriptors of {} models",
            index.len(),
            modelbase.len()
        );
        Self {
            modelbase,
            feature,
            filter,
            settings,
            index,
        }
    }

    /// Extracts the features of a query image.
    pub fn describe(&self, image: DynamicImage) -> Result<Scene> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage);
        }
        let (keypoints, descriptors) = self.feature.detect_and_compute(&image, None);
        trace!("described scene with {} keypoints", keypoints.len());
        Ok(Scene {
            image,
            keypoints,
            descriptors,
        })
    }

    /// The accepted detections in `scene`, in model order.
    pub fn detect(&self, scene: &Scene) -> Vec<Detection<'_>> {
        let mut per_model: Vec<Vec<DescriptorMatch>> = vec![vec![]; self.modelbase.len()];
        for m in self.index.best_matches(&scene.descriptors) {
            per_model[m.image].push(m);
        }

        let mut detections = vec![];
        for (model_index, (model, matches)) in self
            .modelbase
            .models()
            .iter()
            .zip(per_model)
            .enumerate()
        {
            if let Some(detection) = self.fit(scene, model_index, model, matches) {
                let accepted = self.filter.accept(&detection);
                debug!(
                    "model {}: {} matches, {} inliers, {}",
                    model.name(),
                    detection.matches.len(),
                    detection.inliers.len(),
                    if accepted { "accepted" } else { "rejected" }
                );
                if accepted {
                    detections.push(detection);
                }
            }
        }
        detections
    }

    fn fit<'a>(
        &self,
        scene: &Scene,
        model_index: usize,
        model: &'a PlanarModel,
        matches: Vec<DescriptorMatch>,
    ) -> Option<Detection<'a>> {
        let (model_points, scene_points): (Vec<Point2<f64>>, Vec<Point2<f64>>) = matches
            .iter()
            .map(|m| (model.keypoints()[m.train].point, scene.keypoints[m.query].point))
            .unzip();
        let homography = match robust_homography(&model_points, &scene_points, &self.settings) {
            Some(homography) => homography,
            None => {
                debug!(
                    "model {}: no homography from {} matches",
                    model.name(),
                    matches.len()
                );
                return None;
            }
        };
        let inliers = find_inliers(
            &model_points,
            &scene_points,
            &homography,
            self.settings.reprojection_threshold,
        );
        Some(Detection {
            model,
            model_index,
            homography,
            matches,
            inliers,
        })
    }

    pub fn modelbase(&self) -> &Modelbase {
        &self.modelbase
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn filter(&self) -> &DetectionFilter {
        &self.filter
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}
