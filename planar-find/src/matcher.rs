use crate::{DescriptorIndex, DescriptorMatcher};
use bitarray::Hamming;
use log::*;
use planar_core::{Descriptor, DescriptorMatch};
use space::{Knn, LinearKnn};

/// Exhaustive nearest neighbor matching under the Hamming distance.
///
/// With a `ratio`, a match is only reported when its distance is below `ratio` times the
/// distance of the second best candidate, which discards ambiguous matches.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BruteForceHamming {
    pub ratio: Option<f32>,
}

impl BruteForceHamming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ratio(ratio: f32) -> Self {
        Self { ratio: Some(ratio) }
    }
}

impl DescriptorMatcher for BruteForceHamming {
    fn name(&self) -> &str {
        "BruteForce-Hamming"
    }

    fn train(&self, collections: Vec<Vec<Descriptor>>) -> Box<dyn DescriptorIndex> {
        let mut offsets = Vec::with_capacity(collections.len());
        let mut descriptors = Vec::new();
        for collection in collections {
            offsets.push(descriptors.len());
            descriptors.extend(collection);
        }
        debug!(
            "trained brute force index with {} descriptors in {} collections",
            descriptors.len(),
            offsets.len()
        );
        Box::new(HammingIndex {
            ratio: self.ratio,
            descriptors,
            offsets,
        })
    }
}

/// Every collection flattened into one list, with the start offset of each collection.
struct HammingIndex {
    ratio: Option<f32>,
    descriptors: Vec<Descriptor>,
    offsets: Vec<usize>,
}

impl HammingIndex {
    /// Maps a position in the flattened list back to `(collection, position in collection)`.
    fn locate(&self, flat: usize) -> (usize, usize) {
        // Empty collections share their offset with the next one, the last match wins.
        let image = self.offsets.partition_point(|&start| start <= flat) - 1;
        (image, flat - self.offsets[image])
    }
}

impl DescriptorIndex for HammingIndex {
    fn best_matches(&self, queries: &[Descriptor]) -> Vec<DescriptorMatch> {
        if self.descriptors.is_empty() {
            return vec![];
        }
        let knn = LinearKnn {
            metric: Hamming,
            iter: self.descriptors.iter(),
        };
        let neighbors = if self.ratio.is_some() { 2 } else { 1 };
        queries
            .iter()
            .enumerate()
            .filter_map(|(query, descriptor)| {
                let found = knn.knn(descriptor, neighbors);
                let best = found.first()?;
                if let (Some(ratio), Some(second)) = (self.ratio, found.get(1)) {
                    if best.distance as f32 >= ratio * second.distance as f32 {
                        return None;
                    }
                }
                let (image, train) = self.locate(best.index);
                Some(DescriptorMatch {
                    query,
                    train,
                    image,
                    distance: best.distance as u32,
                })
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.descriptors.len()
    }
}
