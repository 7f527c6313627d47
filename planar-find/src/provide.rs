use crate::{Error, Result};
use image::DynamicImage;
use log::*;
use std::{io::BufRead, path::PathBuf};

/// Images decoded one by one from a list of files.
///
/// The iterator ends when the list does; a file that cannot be read yields an error and the
/// iteration may continue with the next one.
pub struct ImageFiles {
    paths: Box<dyn Iterator<Item = std::io::Result<PathBuf>> + Send>,
}

impl ImageFiles {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        Self {
            paths: Box::new(paths.into_iter().map(Ok)),
        }
    }

    /// Reads one file name per line until the first empty line or the end of `reader`.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let paths = reader
            .lines()
            .take_while(|line| !matches!(line, Ok(line) if line.trim().is_empty()))
            .map(|line| line.map(|line| PathBuf::from(line.trim())));
        Self {
            paths: Box::new(paths),
        }
    }
}

impl Iterator for ImageFiles {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = match self.paths.next()? {
            Ok(path) => path,
            Err(e) => return Some(Err(e.into())),
        };
        if !path.is_file() {
            return Some(Err(Error::MissingFile(path)));
        }
        trace!("reading image {}", path.display());
        Some(image::open(&path).map_err(Error::from))
    }
}
