//! Tile engine for partitioning images into encoded tiles.
//!
//! The engine is the main entry point for tiling. For one image it:
//! - Validates the grid spec (before any other work)
//! - Plans tile rectangles in row-major order
//! - Crops and encodes each tile as an independent blocking task
//! - Reassembles results in row-major order
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          TileEngine                             │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    partition()                          │    │
//! │  │  1. Validate spec     4. Crop + encode per tile         │    │
//! │  │  2. Plan rectangles   5. Reorder by tile index          │    │
//! │  │  3. Bound concurrency 6. Return all or nothing          │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌───────────┐      ┌──────────────┐    ┌──────────────────┐  │
//! │    │  plan()   │      │  Semaphore   │    │   TileEncoder    │  │
//! │    └───────────┘      └──────────────┘    └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed encode aborts the whole partition: callers get either every
//! tile or an error naming the tile that failed.

use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::TileError;

use super::encoder::{EncodeSettings, TileEncoder};
use super::grid::{plan, GridSpec, OutputFormat, TileRect};
use super::raster::SourceImage;

// =============================================================================
// Tile
// =============================================================================

/// One encoded tile of a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Position in row-major generation order
    pub index: usize,

    /// Grid row (0-indexed from top)
    pub row: u32,

    /// Grid column (0-indexed from left)
    pub col: u32,

    /// Left edge within the source image
    pub x: u32,

    /// Top edge within the source image
    pub y: u32,

    pub width: u32,
    pub height: u32,

    /// File name, `{prefix}_{row+1}_{col+1}.{ext}`
    pub name: String,

    pub format: OutputFormat,

    /// The encoded tile bytes
    pub data: Bytes,
}

impl Tile {
    /// Size of the encoded bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// The source rectangle this tile was cut from.
    pub fn rect(&self) -> TileRect {
        TileRect {
            index: self.index,
            row: self.row,
            col: self.col,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Crop `rect` out of `pixels` and encode it.
///
/// This is the synchronous unit of work the engine schedules per tile.
pub fn render_tile(
    encoder: &TileEncoder,
    pixels: &DynamicImage,
    rect: TileRect,
    settings: EncodeSettings,
    name: String,
) -> Result<Tile, TileError> {
    let crop = pixels.crop_imm(rect.x, rect.y, rect.width, rect.height);

    let data = encoder
        .encode(&crop, settings)
        .map_err(|e| TileError::EncodeFailure {
            row: rect.row,
            col: rect.col,
            format: settings.format(),
            message: e.to_string(),
        })?;

    Ok(Tile {
        index: rect.index,
        row: rect.row,
        col: rect.col,
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        name,
        format: settings.format(),
        data,
    })
}

// =============================================================================
// Tile Engine
// =============================================================================

/// Partitions images into grids of encoded tiles.
///
/// # Example
///
/// ```ignore
/// use image_tiler::tile::{GridSpec, OutputFormat, SourceImage, TileEngine};
///
/// let engine = TileEngine::new();
/// let image = SourceImage::decode("photo.png", &bytes)?;
/// let spec = GridSpec::new(3, 3).with_overlap(8).with_format(OutputFormat::Jpeg);
///
/// let tiles = engine.partition(&image, &spec).await?;
/// assert_eq!(tiles[0].name, "tile_1_1.jpeg");
/// ```
#[derive(Debug, Clone)]
pub struct TileEngine {
    encoder: TileEncoder,

    /// Upper bound on tiles encoded at the same time
    max_concurrent_encodes: usize,
}

impl Default for TileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TileEngine {
    /// Create an engine that encodes up to one tile per available core.
    pub fn new() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_concurrency(parallelism)
    }

    /// Create an engine with an explicit encode concurrency (at least 1).
    pub fn with_concurrency(max_concurrent_encodes: usize) -> Self {
        Self {
            encoder: TileEncoder::new(),
            max_concurrent_encodes: max_concurrent_encodes.max(1),
        }
    }

    pub fn max_concurrent_encodes(&self) -> usize {
        self.max_concurrent_encodes
    }

    /// Partition `image` into `spec.rows * spec.cols` tiles.
    ///
    /// Tiles are returned in row-major order.
    ///
    /// # Errors
    ///
    /// - [`TileError::InvalidSpec`] if the grid is unusable for this image
    /// - [`TileError::EncodeFailure`] if any tile fails to encode
    pub async fn partition(
        &self,
        image: &SourceImage,
        spec: &GridSpec,
    ) -> Result<Vec<Tile>, TileError> {
        self.partition_with_cancel(image, spec, &CancellationToken::new())
            .await
    }

    /// Like [`partition`](Self::partition) but stops with
    /// [`TileError::Cancelled`] once `cancel` fires.
    ///
    /// The token is checked before each tile is scheduled and while waiting
    /// for results. Pending tiles are aborted on any early return.
    pub async fn partition_with_cancel(
        &self,
        image: &SourceImage,
        spec: &GridSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<Tile>, TileError> {
        let rects = plan(image.width(), image.height(), spec)?;
        let settings = EncodeSettings::for_format(spec.format);

        debug!(
            image = image.id(),
            rows = spec.rows,
            cols = spec.cols,
            overlap = spec.overlap_px,
            format = %spec.format,
            "Partitioning {}x{} image into {} tiles",
            image.width(),
            image.height(),
            rects.len()
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrent_encodes));
        let mut slots: Vec<Option<Tile>> = (0..rects.len()).map(|_| None).collect();
        let mut tasks = JoinSet::new();

        for rect in rects {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TileError::Cancelled),
                permit = Arc::clone(&permits).acquire_owned() => {
                    permit.map_err(|_| TileError::Cancelled)?
                }
            };

            // Surface finished failures before scheduling more work
            while let Some(joined) = tasks.try_join_next() {
                store_result(joined, &mut slots)?;
            }

            let encoder = self.encoder.clone();
            let pixels = image.shared_pixels();
            let name = spec.tile_name(rect.row, rect.col);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                render_tile(&encoder, &pixels, rect, settings, name)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TileError::Cancelled),
                joined = tasks.join_next() => match joined {
                    Some(joined) => store_result(joined, &mut slots)?,
                    None => break,
                },
            }
        }

        let tiles: Vec<Tile> = slots.into_iter().flatten().collect();
        debug_assert_eq!(tiles.len(), spec.tile_count());

        info!(
            image = image.id(),
            tiles = tiles.len(),
            bytes = tiles.iter().map(Tile::byte_size).sum::<usize>(),
            "Partition complete"
        );

        Ok(tiles)
    }

    /// Decode `data` and partition the result.
    ///
    /// The spec is validated before decoding, and decoding runs on a blocking
    /// thread.
    ///
    /// # Errors
    ///
    /// Everything [`partition`](Self::partition) returns, plus
    /// [`TileError::ImageDecodeFailure`] if `data` is not a readable image.
    pub async fn partition_bytes(
        &self,
        image_id: &str,
        data: Bytes,
        spec: &GridSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<Tile>, TileError> {
        spec.validate()?;

        let id = image_id.to_string();
        let image = tokio::task::spawn_blocking(move || SourceImage::decode(id, &data))
            .await
            .map_err(|e| TileError::ImageDecodeFailure {
                image_id: image_id.to_string(),
                message: e.to_string(),
            })??;

        if cancel.is_cancelled() {
            return Err(TileError::Cancelled);
        }

        self.partition_with_cancel(&image, spec, cancel).await
    }

    /// Partition on the calling thread, one tile after another.
    ///
    /// Produces the same tiles as [`partition`](Self::partition) without
    /// needing a runtime.
    pub fn partition_blocking(
        &self,
        image: &SourceImage,
        spec: &GridSpec,
    ) -> Result<Vec<Tile>, TileError> {
        let settings = EncodeSettings::for_format(spec.format);

        plan(image.width(), image.height(), spec)?
            .into_iter()
            .map(|rect| {
                let name = spec.tile_name(rect.row, rect.col);
                render_tile(&self.encoder, image.pixels(), rect, settings, name)
            })
            .collect()
    }
}

/// Place a finished tile in its row-major slot.
fn store_result(
    joined: Result<Result<Tile, TileError>, JoinError>,
    slots: &mut [Option<Tile>],
) -> Result<(), TileError> {
    match joined {
        Ok(Ok(tile)) => {
            let index = tile.index;
            slots[index] = Some(tile);
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(TileError::Cancelled),
    }
}

// =============================================================================
// Tests
// =============================================================================
