//! # Image Tiler
//!
//! Splits raster images into a grid of rectangular, optionally overlapping
//! tiles and encodes each tile as PNG, JPEG or WebP.
//!
//! ## Features
//!
//! - **Grid partitioning**: Any rows x cols grid, with the remainder pixels absorbed by the last row and column
//! - **Overlap**: Tiles can be padded by a fixed number of pixels, clamped to the image
//! - **Concurrent encoding**: Tiles are cropped and encoded on blocking threads, bounded by a semaphore
//! - **Batch mode**: Many images in one run, with per-image failures recorded instead of aborting
//! - **Manifest**: Optional JSON summary with geometry and SHA-256 digests
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`tile`] - Grid geometry, encoding and the tile engine
//! - [`batch`] - Batch driver running the engine over many images
//! - [`source`] - Where encoded images are loaded from
//! - [`output`] - Writing tiles and manifests to disk
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_tiler::{GridSpec, OutputFormat, SourceImage, TileEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data = std::fs::read("photo.png")?;
//!     let image = SourceImage::decode("photo.png", &data)?;
//!
//!     let spec = GridSpec::new(3, 3)
//!         .with_overlap(16)
//!         .with_format(OutputFormat::WebP);
//!
//!     let tiles = TileEngine::new().partition(&image, &spec).await?;
//!     for tile in &tiles {
//!         std::fs::write(&tile.name, &tile.data)?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod source;
pub mod tile;

// Re-export commonly used types
pub use batch::{BatchDriver, BatchFailure, BatchJob, BatchProgress, BatchReport};
pub use config::{BatchConfig, Cli, Command, GridArgs, PlanConfig, SplitConfig};
pub use error::{IoError, TileError};
pub use output::{format_file_size, write_tiles, TileManifest};
pub use source::{FsImageSource, ImageSource};
pub use tile::{
    plan, EncodeSettings, GridPreset, GridSpec, OutputFormat, SourceImage, Tile, TileEncoder,
    TileEngine, TileRect,
};
