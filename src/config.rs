//! Configuration management for the image tiler.
//!
//! This module provides the command-line interface:
//! - Command-line arguments via clap
//! - Environment variables with `TILER_` prefix
//! - Defaults matching the tiler's form defaults (2x2 grid, no overlap, PNG)
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use image_tiler::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! if let Command::Split(config) = cli.command {
//!     println!("Splitting {} into {} tiles", config.image.display(), config.grid.spec("tile").tile_count());
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `TILER_ROWS` - Grid rows (default: 2)
//! - `TILER_COLS` - Grid columns (default: 2)
//! - `TILER_GRID` - Grid shorthand such as `3x3`, instead of rows/cols
//! - `TILER_OVERLAP` - Overlap in pixels (default: 0)
//! - `TILER_FORMAT` - Output format: png, jpeg or webp (default: png)
//! - `TILER_CONCURRENCY` - Max tiles encoded at once (default: CPU count)
//! - `TILER_PREFIX` - Tile name prefix (default: tile)
//! - `TILER_OUTPUT` - Output directory (default: tiles)
//! - `TILER_MANIFEST` - Write manifest.json (default: false)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::tile::{
    GridPreset, GridSpec, OutputFormat, TileEngine, DEFAULT_COLS, DEFAULT_NAME_PREFIX,
    DEFAULT_OVERLAP_PX, DEFAULT_ROWS,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "tiles";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Tiler - split images into grid tiles.
///
/// Cuts each image into a rows x cols grid of optionally overlapping tiles
/// and writes them as PNG, JPEG or WebP files named `{prefix}_{row}_{col}`.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-tiler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split one image into tiles.
    Split(SplitConfig),

    /// Split several images, skipping any that fail.
    Batch(BatchConfig),

    /// Print the tile rectangles for an image size without encoding.
    Plan(PlanConfig),
}

// =============================================================================
// Grid Arguments
// =============================================================================

/// Grid options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    /// Number of tile rows.
    #[arg(long, default_value_t = DEFAULT_ROWS, env = "TILER_ROWS")]
    pub rows: u32,

    /// Number of tile columns.
    #[arg(long, default_value_t = DEFAULT_COLS, env = "TILER_COLS")]
    pub cols: u32,

    /// Grid shorthand `ROWSxCOLS` (e.g. 3x3), instead of --rows and --cols.
    #[arg(short, long, env = "TILER_GRID", conflicts_with_all = ["rows", "cols"])]
    pub grid: Option<GridPreset>,

    /// Extra pixels added around each tile, clamped to the image.
    #[arg(short, long, default_value_t = DEFAULT_OVERLAP_PX, env = "TILER_OVERLAP")]
    pub overlap: u32,

    /// Output format for tiles.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png, env = "TILER_FORMAT")]
    pub format: OutputFormat,

    /// Maximum number of tiles encoded concurrently.
    ///
    /// Defaults to the number of available CPU cores.
    #[arg(long, env = "TILER_CONCURRENCY")]
    pub max_concurrent_encodes: Option<usize>,
}

impl GridArgs {
    /// Effective `(rows, cols)`, with `--grid` taking precedence.
    ///
    /// The parser rejects `--grid` together with `--rows` or `--cols`, so
    /// a preset only ever replaces the defaults.
    pub fn dimensions(&self) -> (u32, u32) {
        match self.grid {
            Some(preset) => (preset.rows, preset.cols),
            None => (self.rows, self.cols),
        }
    }

    /// Build the grid spec with the given name prefix.
    pub fn spec(&self, prefix: &str) -> GridSpec {
        let (rows, cols) = self.dimensions();
        GridSpec::new(rows, cols)
            .with_overlap(self.overlap)
            .with_format(self.format)
            .with_prefix(prefix)
    }

    /// Build a tile engine honoring the concurrency setting.
    pub fn engine(&self) -> TileEngine {
        match self.max_concurrent_encodes {
            Some(limit) => TileEngine::with_concurrency(limit),
            None => TileEngine::new(),
        }
    }

    /// Validate the grid options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let (rows, cols) = self.dimensions();
        if rows == 0 {
            return Err("rows must be greater than 0".to_string());
        }
        if cols == 0 {
            return Err("cols must be greater than 0".to_string());
        }
        if self.max_concurrent_encodes == Some(0) {
            return Err("max_concurrent_encodes must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Split Command
// =============================================================================

/// Options for splitting a single image.
#[derive(Args, Debug, Clone)]
pub struct SplitConfig {
    /// Image file to split.
    pub image: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Prefix for tile file names.
    #[arg(long, default_value = DEFAULT_NAME_PREFIX, env = "TILER_PREFIX")]
    pub prefix: String,

    /// Directory tiles are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR, env = "TILER_OUTPUT")]
    pub output: PathBuf,

    /// Also write manifest.json describing every tile.
    #[arg(long, default_value_t = false, env = "TILER_MANIFEST")]
    pub manifest: bool,
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()?;
        validate_prefix(&self.prefix)
    }

    pub fn spec(&self) -> GridSpec {
        self.grid.spec(&self.prefix)
    }
}

// =============================================================================
// Batch Command
// =============================================================================

/// Options for splitting several images.
#[derive(Args, Debug, Clone)]
pub struct BatchConfig {
    /// Image files to split, processed in order.
    #[arg(required = true, num_args = 1..)]
    pub images: Vec<PathBuf>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Prefix used for images whose file name has no usable stem.
    #[arg(long, default_value = DEFAULT_NAME_PREFIX, env = "TILER_PREFIX")]
    pub prefix: String,

    /// Directory tiles are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR, env = "TILER_OUTPUT")]
    pub output: PathBuf,

    /// Also write manifest.json describing every tile and skipped image.
    #[arg(long, default_value_t = false, env = "TILER_MANIFEST")]
    pub manifest: bool,
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.images.is_empty() {
            return Err("at least one image is required".to_string());
        }
        self.grid.validate()?;
        validate_prefix(&self.prefix)
    }

    pub fn spec(&self) -> GridSpec {
        self.grid.spec(&self.prefix)
    }

    /// Image identifiers in queue order.
    pub fn image_ids(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|path| path.display().to_string())
            .collect()
    }
}

// =============================================================================
// Plan Command
// =============================================================================

/// Options for printing tile geometry.
#[derive(Args, Debug, Clone)]
pub struct PlanConfig {
    /// Read the size from this image instead of --width/--height.
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub image: Option<PathBuf>,

    /// Image width in pixels.
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Image height in pixels.
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Prefix for tile names.
    #[arg(long, default_value = DEFAULT_NAME_PREFIX, env = "TILER_PREFIX")]
    pub prefix: String,
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.image.is_none() && (self.width.is_none() || self.height.is_none()) {
            return Err("either --image or both --width and --height are required".to_string());
        }
        self.grid.validate()?;
        validate_prefix(&self.prefix)
    }

    pub fn spec(&self) -> GridSpec {
        self.grid.spec(&self.prefix)
    }
}

/// Prefixes become part of file names, so path separators are not allowed.
fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.trim().is_empty() {
        return Err("prefix must not be empty".to_string());
    }
    if prefix.contains(['/', '\\']) {
        return Err(format!("prefix '{}' must not contain path separators", prefix));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
