//! Tile encoder.
//!
//! This module turns cropped tile pixels into PNG, JPEG or WebP bytes.
//!
//! # Design Decisions
//!
//! - **Tagged settings**: Each format carries only the parameters it
//!   understands. JPEG is the only lossy format and has a fixed quality of 90;
//!   PNG and WebP use their default lossless encoders.
//!
//! - **Color normalization**: JPEG has no alpha channel, so tiles are
//!   flattened to RGB (or kept as 8-bit gray). WebP only accepts 8-bit
//!   buffers. PNG keeps the source color type unless it is floating point.
//!
//! - **Deterministic**: The same pixels and settings always produce the same
//!   bytes.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageResult};

use super::grid::OutputFormat;

/// JPEG quality used for lossy tiles (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Encode Settings
// =============================================================================

/// Per-format encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeSettings {
    Png,
    Jpeg { quality: u8 },
    WebP,
}

impl EncodeSettings {
    /// Settings used for tiles of the given format.
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => EncodeSettings::Png,
            OutputFormat::Jpeg => EncodeSettings::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            },
            OutputFormat::WebP => EncodeSettings::WebP,
        }
    }

    pub fn format(self) -> OutputFormat {
        match self {
            EncodeSettings::Png => OutputFormat::Png,
            EncodeSettings::Jpeg { .. } => OutputFormat::Jpeg,
            EncodeSettings::WebP => OutputFormat::WebP,
        }
    }
}

impl From<OutputFormat> for EncodeSettings {
    fn from(format: OutputFormat) -> Self {
        EncodeSettings::for_format(format)
    }
}

// =============================================================================
// Tile Encoder
// =============================================================================

/// Encoder for cropped tile pixels.
#[derive(Debug, Clone, Default)]
pub struct TileEncoder {}

impl TileEncoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Encode `pixels` with the given settings.
    ///
    /// # Errors
    ///
    /// Returns the codec error if the encoder rejects the buffer.
    pub fn encode(&self, pixels: &DynamicImage, settings: EncodeSettings) -> ImageResult<Bytes> {
        let mut output = Vec::new();

        match settings {
            EncodeSettings::Png => {
                let encoder = PngEncoder::new(&mut output);
                match pixels.color() {
                    ColorType::Rgb32F | ColorType::Rgba32F => {
                        DynamicImage::ImageRgba16(pixels.to_rgba16()).write_with_encoder(encoder)?
                    }
                    _ => pixels.write_with_encoder(encoder)?,
                }
            }
            EncodeSettings::Jpeg { quality } => {
                let quality = clamp_quality(quality);
                let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
                match pixels {
                    DynamicImage::ImageLuma8(gray) => encoder.encode_image(gray)?,
                    other => encoder.encode_image(&other.to_rgb8())?,
                }
            }
            EncodeSettings::WebP => {
                let encoder = WebPEncoder::new_lossless(&mut output);
                match pixels {
                    DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
                        pixels.write_with_encoder(encoder)?
                    }
                    other if other.color().has_alpha() => {
                        DynamicImage::ImageRgba8(other.to_rgba8()).write_with_encoder(encoder)?
                    }
                    other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder)?,
                }
            }
        }

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
