//! Image source abstraction.
//!
//! The batch driver loads raw image bytes through the [`ImageSource`] trait,
//! so it does not care whether images come from local files or from memory
//! in tests.
//!
//! # Usage
//!
//! ```ignore
//! use image_tiler::source::{FsImageSource, ImageSource};
//!
//! let source = FsImageSource::new();
//! let bytes = source.load("photos/beach.jpg").await?;
//! ```

mod fs_source;

pub use fs_source::FsImageSource;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for loading encoded images by identifier.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Load the encoded bytes of the image identified by `image_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NotFound`] if there is no such image.
    async fn load(&self, image_id: &str) -> Result<Bytes, IoError>;
}
