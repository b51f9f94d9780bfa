//! Decoded source images.
//!
//! A [`SourceImage`] is the read-only input of the tile engine. Pixels are
//! held behind an `Arc` so concurrent tile encodes can crop from the same
//! buffer without copying it; nothing in the engine ever mutates them.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageReader};

use crate::error::TileError;

/// A decoded raster with a caller-chosen identifier.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: Arc<str>,
    pixels: Arc<DynamicImage>,
}

impl SourceImage {
    /// Wrap already decoded pixels.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::ImageDecodeFailure`] if the image has no pixels.
    pub fn new(id: impl Into<Arc<str>>, pixels: DynamicImage) -> Result<Self, TileError> {
        let id = id.into();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(TileError::ImageDecodeFailure {
                image_id: id.to_string(),
                message: format!("image is empty ({}x{})", pixels.width(), pixels.height()),
            });
        }

        Ok(Self {
            id,
            pixels: Arc::new(pixels),
        })
    }

    /// Decode an encoded image, sniffing the format from its magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::ImageDecodeFailure`] if the format is unknown or
    /// the data is corrupt.
    pub fn decode(id: impl Into<Arc<str>>, data: &[u8]) -> Result<Self, TileError> {
        let id = id.into();
        let failure = |message: String| TileError::ImageDecodeFailure {
            image_id: id.to_string(),
            message,
        };

        if data.is_empty() {
            return Err(failure("input is empty".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| failure(e.to_string()))?;

        if reader.format().is_none() {
            return Err(failure("unrecognized image format".to_string()));
        }

        let pixels = reader.decode().map_err(|e| failure(e.to_string()))?;
        Self::new(id.clone(), pixels)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub(crate) fn shared_pixels(&self) -> Arc<DynamicImage> {
        Arc::clone(&self.pixels)
    }
}

/// Read the dimensions of an encoded image without decoding its pixels.
pub fn probe_dimensions(id: &str, data: &[u8]) -> Result<(u32, u32), TileError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| e.to_string())
        .and_then(|reader| reader.into_dimensions().map_err(|e| e.to_string()))
        .map_err(|message| TileError::ImageDecodeFailure {
            image_id: id.to_string(),
            message,
        })
}
