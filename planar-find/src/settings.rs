use crate::Result;
use log::*;
use planar_core::DEFAULT_REPROJECTION_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// The settings for homography fitting during detection and sequence estimation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// The maximum distance in pixels between a projected model point and its scene point for
    /// the correspondence to count as an inlier
    #[serde(default = "default_reprojection_threshold")]
    pub reprojection_threshold: f64,
    /// The seed of the random generator driving the consensus process
    ///
    /// Every fit starts from this seed, so a detection is reproducible for a given scene.
    #[serde(default = "default_consensus_seed")]
    pub consensus_seed: u64,
}

impl DetectorSettings {
    pub fn with_reprojection_threshold(reprojection_threshold: f64) -> Self {
        Self {
            reprojection_threshold,
            ..Default::default()
        }
    }

    /// Loads settings from a JSON document. Missing fields take their default value.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        info!("loaded detector settings from {}", path.display());
        Ok(settings)
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            reprojection_threshold: default_reprojection_threshold(),
            consensus_seed: default_consensus_seed(),
        }
    }
}

fn default_reprojection_threshold() -> f64 {
    DEFAULT_REPROJECTION_THRESHOLD
}

fn default_consensus_seed() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: DetectorSettings = serde_json::from_str(r#"{"consensus_seed": 9}"#).unwrap();
        assert_eq!(settings.reprojection_threshold, 3.0);
        assert_eq!(settings.consensus_seed, 9);
        let settings: DetectorSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, DetectorSettings::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reprojection_threshold": 1.5}}"#).unwrap();
        let settings = DetectorSettings::load(file.path()).unwrap();
        assert_eq!(settings, DetectorSettings::with_reprojection_threshold(1.5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DetectorSettings::load(dir.path().join("settings.json")),
            Err(crate::Error::Io(_))
        ));
    }
}
