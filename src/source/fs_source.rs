//! Filesystem-backed image source.
//!
//! Identifiers are paths. Relative identifiers resolve against an optional
//! root directory, otherwise against the process working directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

use super::ImageSource;

/// Loads images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    root: Option<PathBuf>,
}

impl FsImageSource {
    /// Resolve identifiers as given.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Resolve relative identifiers under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The path an identifier resolves to.
    pub fn resolve(&self, image_id: &str) -> PathBuf {
        let path = Path::new(image_id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn load(&self, image_id: &str) -> Result<Bytes, IoError> {
        let path = self.resolve(image_id);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| IoError::read(path.display().to_string(), e))?;
        Ok(Bytes::from(data))
    }
}
