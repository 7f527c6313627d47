//! Homography and color documents.
//!
//! Both are JSON objects holding a single matrix record shaped like an OpenCV matrix node:
//!
//! ```text
//! { "homography": { "rows": 3, "cols": 3, "dt": "d", "data": [1.0, 0.0, 0.0, ...] } }
//! { "color": { "rows": 1, "cols": 4, "dt": "u", "data": [255, 0, 0, 255] } }
//! ```
//!
//! Since JSON is a subset of YAML 1.2, the `.yml` file names of a model directory are kept.

use crate::{Error, Result};
use image::Rgba;
use log::*;
use planar_core::Homography;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

#[derive(Debug, Serialize, Deserialize)]
struct MatrixRecord<T> {
    rows: usize,
    cols: usize,
    dt: String,
    data: Vec<T>,
}

impl<T> MatrixRecord<T> {
    fn new(rows: usize, cols: usize, dt: &str, data: Vec<T>) -> Self {
        Self {
            rows,
            cols,
            dt: dt.to_owned(),
            data,
        }
    }

    /// The elements of a `rows` x `cols` record in row-major order.
    fn into_elements(self, rows: usize, cols: usize, path: &Path) -> Result<Vec<T>> {
        if self.rows != rows || self.cols != cols || self.data.len() != rows * cols {
            return Err(Error::MalformedDocument {
                path: path.to_owned(),
                reason: format!(
                    "expected a {}x{} matrix, found {}x{} with {} elements",
                    rows,
                    cols,
                    self.rows,
                    self.cols,
                    self.data.len()
                ),
            });
        }
        Ok(self.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HomographyDocument {
    homography: MatrixRecord<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColorDocument {
    color: MatrixRecord<i64>,
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads the homography stored at `path`.
pub fn read_homography(path: impl AsRef<Path>) -> Result<Homography> {
    let path = path.as_ref();
    let document: HomographyDocument = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let elements = document.homography.into_elements(3, 3, path)?;
    trace!("read homography from {}", path.display());
    Ok(Homography::from_row_slice(&elements))
}

/// Stores `homography` at `path`, replacing any existing file.
pub fn write_homography(path: impl AsRef<Path>, homography: &Homography) -> Result<()> {
    let document = HomographyDocument {
        homography: MatrixRecord::new(3, 3, "d", homography.to_row_array().to_vec()),
    };
    write_document(path.as_ref(), &document)
}

/// Reads the homography at `source` and stores its inverse at `destination`.
///
/// The inverse is scaled so its bottom-right element is exactly `1.0`.
pub fn invert_homography(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<()> {
    let homography = read_homography(source)?;
    let inverse = homography.inverse().ok_or(Error::SingularHomography)?;
    write_homography(destination, &inverse)
}

/// Reads the RGBA color stored at `path`.
pub fn read_color(path: impl AsRef<Path>) -> Result<Rgba<u8>> {
    let path = path.as_ref();
    let document: ColorDocument = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let elements = document.color.into_elements(1, 4, path)?;
    let mut channels = [0u8; 4];
    for (channel, &value) in channels.iter_mut().zip(&elements) {
        *channel = u8::try_from(value).map_err(|_| Error::MalformedDocument {
            path: path.to_owned(),
            reason: format!("color channel {} is not a byte", value),
        })?;
    }
    Ok(Rgba(channels))
}

/// Stores `color` at `path`, replacing any existing file.
pub fn write_color(path: impl AsRef<Path>, color: Rgba<u8>) -> Result<()> {
    let document = ColorDocument {
        color: MatrixRecord::new(1, 4, "u", color.0.iter().map(|&c| c as i64).collect()),
    };
    write_document(path.as_ref(), &document)
}
