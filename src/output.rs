//! Writing tiles to disk.
//!
//! Tiles are written to a directory under their own names. An optional JSON
//! manifest records the geometry, size and SHA-256 digest of every tile so
//! runs can be compared without diffing images.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::batch::BatchFailure;
use crate::error::IoError;
use crate::tile::{GridSpec, Tile};

/// File name of the manifest written next to the tiles.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

// =============================================================================
// Tile Files
// =============================================================================

/// Write every tile into `dir`, creating it if needed.
///
/// Returns the written paths in tile order.
pub async fn write_tiles(dir: &Path, tiles: &[Tile]) -> Result<Vec<PathBuf>, IoError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IoError::write(dir.display().to_string(), e))?;

    let mut paths = Vec::with_capacity(tiles.len());
    for tile in tiles {
        let path = dir.join(&tile.name);
        tokio::fs::write(&path, &tile.data)
            .await
            .map_err(|e| IoError::write(path.display().to_string(), e))?;
        debug!(path = %path.display(), bytes = tile.byte_size(), "Wrote tile");
        paths.push(path);
    }

    Ok(paths)
}

// =============================================================================
// Manifest
// =============================================================================

/// One tile as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestTile {
    pub name: String,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub mime_type: &'static str,
    pub sha256: String,
}

impl From<&Tile> for ManifestTile {
    fn from(tile: &Tile) -> Self {
        Self {
            name: tile.name.clone(),
            row: tile.row,
            col: tile.col,
            x: tile.x,
            y: tile.y,
            width: tile.width,
            height: tile.height,
            byte_size: tile.byte_size(),
            mime_type: tile.format.mime_type(),
            sha256: hex::encode(Sha256::digest(&tile.data)),
        }
    }
}

/// A skipped batch image as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFailure {
    pub image_id: String,
    pub error: String,
}

impl From<&BatchFailure> for ManifestFailure {
    fn from(failure: &BatchFailure) -> Self {
        Self {
            image_id: failure.image_id.clone(),
            error: failure.error.to_string(),
        }
    }
}

/// Summary of a tiling run.
#[derive(Debug, Clone, Serialize)]
pub struct TileManifest {
    pub spec: GridSpec,
    pub tile_count: usize,
    pub total_bytes: usize,
    pub tiles: Vec<ManifestTile>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ManifestFailure>,
}

impl TileManifest {
    pub fn new(spec: &GridSpec, tiles: &[Tile]) -> Self {
        Self {
            spec: spec.clone(),
            tile_count: tiles.len(),
            total_bytes: tiles.iter().map(Tile::byte_size).sum(),
            tiles: tiles.iter().map(ManifestTile::from).collect(),
            failures: Vec::new(),
        }
    }

    pub fn with_failures(mut self, failures: &[BatchFailure]) -> Self {
        self.failures = failures.iter().map(ManifestFailure::from).collect();
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest as `manifest.json` inside `dir`.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, IoError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let json = self.to_json().map_err(|e| IoError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| IoError::write(path.display().to_string(), e))?;
        Ok(path)
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Human readable byte size, e.g. `0 Bytes`, `512 Bytes`, `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut scale = 1u64;
    while exponent + 1 < UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        exponent += 1;
    }
    let value = bytes as f64 / scale as f64;

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

// =============================================================================
// Tests
// =============================================================================
