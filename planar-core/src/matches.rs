use nalgebra::Point2;

/// A point correspondence between a source and a target image frame.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FeatureMatch(pub Point2<f64>, pub Point2<f64>);

/// The best match of one query descriptor inside a trained set of descriptor collections.
///
/// This mirrors OpenCV's `DMatch`: `query` indexes the query descriptors, `image` selects the
/// collection the match landed in and `train` indexes the descriptors of that collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorMatch {
    pub query: usize,
    pub train: usize,
    pub image: usize,
    pub distance: u32,
}
