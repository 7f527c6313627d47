use crate::{storage, Error, Feature, Result};
use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgba};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::*;
use planar_core::{perspective_transform_keypoints, Descriptor, Homography, KeyPoint};
use std::path::{Path, PathBuf};

/// The color of a model when none is given: opaque red.
pub const DEFAULT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

const REFERENCE_IMAGE: &str = "ref.jpg";
const REFERENCE_ROI: &str = "roi.png";
const INFO: &str = "info.yml";
const VIEW_IMAGE_EXTENSION: &str = "jpg";

/// Maximum deviation from the identity tolerated for the reference view's homography.
const REFERENCE_TOLERANCE: f64 = 1e-9;

fn require_file(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingFile(path))
    }
}

/// Sets every positive pixel to 255.
fn binarize(mut roi: GrayImage) -> GrayImage {
    for Luma([value]) in roi.pixels_mut() {
        if *value > 0 {
            *value = 255;
        }
    }
    roi
}

/// One calibrated image of a planar object.
///
/// The homography maps the coordinates of the model's reference view into the pixel frame of
/// this view. Every keypoint was detected inside the region of interest.
#[derive(Debug, Clone)]
pub struct PlanarView {
    image: DynamicImage,
    roi: GrayImage,
    homography: Homography,
    keypoints: Vec<KeyPoint>,
    descriptors: Vec<Descriptor>,
}

impl PlanarView {
    /// Assembles a view from already extracted features.
    pub fn new(
        image: DynamicImage,
        roi: GrayImage,
        homography: Homography,
        keypoints: Vec<KeyPoint>,
        descriptors: Vec<Descriptor>,
    ) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage);
        }
        if keypoints.len() != descriptors.len() {
            return Err(Error::MisalignedDescriptors {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            image,
            roi,
            homography,
            keypoints,
            descriptors,
        })
    }

    /// Extracts the features of `image` inside `roi`.
    ///
    /// The stored region of interest is binarized: every positive pixel becomes 255.
    pub fn create(
        image: DynamicImage,
        roi: GrayImage,
        homography: Homography,
        feature: &Feature,
    ) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 || roi.width() == 0 || roi.height() == 0 {
            return Err(Error::EmptyImage);
        }
        let roi = binarize(roi);
        let (keypoints, descriptors) = feature.detect_and_compute(&image, Some(&roi));
        trace!("created view with {} keypoints", keypoints.len());
        Self::new(image, roi, homography, keypoints, descriptors)
    }

    /// Loads the view whose homography is stored at `path`.
    ///
    /// The image is the `.jpg` file next to `path` with the same stem. The reference region of
    /// interest is warped into the frame of this view before the features are extracted.
    pub fn load(path: impl AsRef<Path>, reference_roi: &GrayImage, feature: &Feature) -> Result<Self> {
        let path = path.as_ref();
        let homography = storage::read_homography(path)?;
        let image = image::open(require_file(path.with_extension(VIEW_IMAGE_EXTENSION))?)?;
        let projection = Projection::from_matrix(homography.to_row_array().map(|x| x as f32))
            .ok_or(Error::SingularHomography)?;
        let mut roi = GrayImage::new(image.width(), image.height());
        warp_into(
            reference_roi,
            &projection,
            Interpolation::Nearest,
            Luma([0]),
            &mut roi,
        );
        debug!("loaded view {}", path.display());
        Self::create(image, roi, homography, feature)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn roi(&self) -> &GrayImage {
        &self.roi
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }
}

/// A named planar object seen from one or more views.
///
/// The first view is the reference: its homography is the identity and its frame is the frame
/// of the model. The keypoints of all views are pooled in that frame, in view order, next to
/// their descriptors. A pooled index therefore identifies exactly one keypoint of one view,
/// see [`PlanarModel::view_of`].
#[derive(Debug, Clone)]
pub struct PlanarModel {
    name: String,
    color: Rgba<u8>,
    views: Vec<PlanarView>,
    keypoints: Vec<KeyPoint>,
    descriptors: Vec<Descriptor>,
    view_offsets: Vec<usize>,
}

impl PlanarModel {
    /// Pools the features of `views`.
    ///
    /// Fails if there is no view, if the first homography is not the identity or if any view
    /// homography cannot be inverted.
    pub fn new(name: impl Into<String>, color: Rgba<u8>, views: Vec<PlanarView>) -> Result<Self> {
        let reference = views.first().ok_or(Error::InvalidReference)?;
        if reference.homography.distance(&Homography::identity()) > REFERENCE_TOLERANCE {
            return Err(Error::InvalidReference);
        }

        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();
        let mut view_offsets = Vec::with_capacity(views.len());
        for view in &views {
            let to_reference = view
                .homography
                .inverse()
                .ok_or(Error::SingularHomography)?;
            view_offsets.push(keypoints.len());
            keypoints.extend(perspective_transform_keypoints(&view.keypoints, &to_reference));
            descriptors.extend(view.descriptors.iter().cloned());
        }

        let name = name.into();
        info!(
            "model {} has {} keypoints in {} views",
            name,
            keypoints.len(),
            views.len()
        );
        Ok(Self {
            name,
            color,
            views,
            keypoints,
            descriptors,
            view_offsets,
        })
    }

    /// A model with the single reference view `image`.
    pub fn create(
        name: impl Into<String>,
        image: DynamicImage,
        roi: GrayImage,
        color: Rgba<u8>,
        feature: &Feature,
    ) -> Result<Self> {
        let view = PlanarView::create(image, roi, Homography::identity(), feature)?;
        Self::new(name, color, vec![view])
    }

    /// Loads the model stored in the directory `path`.
    ///
    /// The directory holds the reference image `ref.jpg`, its region of interest `roi.png` and
    /// the color record `info.yml`. Further views are `001.yml`, `002.yml` and so on, each with
    /// its image next to it, read until the first missing number. The model is named after the
    /// directory.
    pub fn load(path: impl AsRef<Path>, feature: &Feature) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(require_file(path.join(REFERENCE_IMAGE))?)?;
        let roi = image::open(require_file(path.join(REFERENCE_ROI))?)?.to_luma8();
        let color = storage::read_color(require_file(path.join(INFO))?)?;
        if color[3] != 255 {
            return Err(Error::TransparentColor(color));
        }

        let reference = PlanarView::create(image, roi, Homography::identity(), feature)?;
        let mut views = vec![reference];
        for number in 1.. {
            let view_path = path.join(format!("{:03}.yml", number));
            if !view_path.is_file() {
                break;
            }
            let view = PlanarView::load(&view_path, &views[0].roi, feature)?;
            views.push(view);
        }

        let name = path
            .file_name()
            .unwrap_or(path.as_os_str())
            .to_string_lossy()
            .into_owned();
        Self::new(name, color, views)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn views(&self) -> &[PlanarView] {
        &self.views
    }

    /// The keypoints of every view in the reference frame.
    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }

    /// The descriptors of every view, aligned with [`PlanarModel::keypoints`].
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// The view and the keypoint index inside it of the pooled keypoint `pooled`.
    pub fn view_of(&self, pooled: usize) -> Option<(usize, usize)> {
        if pooled >= self.keypoints.len() {
            return None;
        }
        let view = self.view_offsets.partition_point(|&start| start <= pooled) - 1;
        Some((view, pooled - self.view_offsets[view]))
    }
}

/// The models a [`crate::Detector`] searches for.
#[derive(Debug, Clone, Default)]
pub struct Modelbase {
    feature: Feature,
    models: Vec<PlanarModel>,
}

impl Modelbase {
    /// An empty modelbase that loads models with `feature`.
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            models: vec![],
        }
    }

    pub fn add(&mut self, model: PlanarModel) {
        self.models.push(model);
    }

    /// Loads the model directory at `path` and adds it.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let model = PlanarModel::load(path, &self.feature)?;
        self.add(model);
        Ok(())
    }

    /// The index of the first model called `name`.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|model| model.name == name)
    }

    pub fn models(&self) -> &[PlanarModel] {
        &self.models
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
