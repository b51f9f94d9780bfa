//! Tile engine layer.
//!
//! This module partitions a decoded image into a grid of possibly
//! overlapping rectangular tiles and encodes each tile.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        BatchDriver / CLI caller         │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileEngine                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   plan()     │  │   TileEncoder   │  │
//! │  │  (geometry)  │  │  (crop →        │  │
//! │  │              │  │   PNG/JPEG/WebP)│  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │         SourceImage (read-only)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileEngine`]: Main entry point, runs the full partition pipeline
//! - [`GridSpec`]: Rows, columns, overlap, output format and name prefix
//! - [`plan`]: Pure geometry producing [`TileRect`]s in row-major order
//! - [`TileEncoder`]: Encodes cropped pixels according to [`EncodeSettings`]
//! - [`SourceImage`]: Decoded input raster
//! - [`Tile`]: Named, encoded output artifact
//!
//! # Example
//!
//! ```
//! use image_tiler::tile::{plan, GridSpec};
//!
//! let rects = plan(200, 100, &GridSpec::new(1, 2)).unwrap();
//! assert_eq!(rects.len(), 2);
//! assert_eq!((rects[1].x, rects[1].width), (100, 100));
//! ```

mod encoder;
mod engine;
mod grid;
mod raster;

pub use encoder::{
    clamp_quality, EncodeSettings, TileEncoder, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use engine::{render_tile, Tile, TileEngine};
pub use grid::{
    plan, GridPreset, GridSpec, OutputFormat, TileRect, DEFAULT_COLS, DEFAULT_NAME_PREFIX,
    DEFAULT_OVERLAP_PX, DEFAULT_ROWS,
};
pub use raster::{probe_dimensions, SourceImage};
