//! Grid geometry.
//!
//! Computes the pixel rectangle of every tile for a given image size and
//! [`GridSpec`]. This is the pure half of partitioning: no pixels are touched
//! here, which makes it usable for dry runs and cheap to test exhaustively.
//!
//! # Layout Rules
//!
//! - Base tile size is `floor(width / cols)` × `floor(height / rows)`.
//! - Each tile grows by `overlap_px` on every side, clamped to the image.
//! - The last column and last row extend to the image edge, absorbing any
//!   remainder left by the integer division. Remainders are not spread
//!   across tiles.
//! - Rectangles are produced in row-major order; the order determines tile
//!   names and is part of the output contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TileError;

/// Default number of grid rows.
pub const DEFAULT_ROWS: u32 = 2;

/// Default number of grid columns.
pub const DEFAULT_COLS: u32 = 2;

/// Default overlap in pixels.
pub const DEFAULT_OVERLAP_PX: u32 = 0;

/// Default tile name prefix.
pub const DEFAULT_NAME_PREFIX: &str = "tile";

// =============================================================================
// Output Format
// =============================================================================

/// Raster format tiles are encoded in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    #[value(name = "webp")]
    WebP,
}

impl OutputFormat {
    /// File extension used in tile names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::WebP => "webp",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "webp" => Ok(OutputFormat::WebP),
            other => Err(TileError::invalid_spec(format!(
                "unsupported output format: {other}"
            ))),
        }
    }
}

// =============================================================================
// Grid Spec
// =============================================================================

/// Parameters controlling how an image is partitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of tile rows (>= 1)
    pub rows: u32,

    /// Number of tile columns (>= 1)
    pub cols: u32,

    /// Extra margin added around every tile, clamped to the image
    pub overlap_px: u32,

    /// Encoding of the produced tiles
    pub format: OutputFormat,

    /// Prefix of generated tile names
    pub name_prefix: String,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            overlap_px: DEFAULT_OVERLAP_PX,
            format: OutputFormat::default(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl GridSpec {
    /// Create a spec with the given grid and defaults for everything else.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    pub fn with_overlap(mut self, overlap_px: u32) -> Self {
        self.overlap_px = overlap_px;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Total number of tiles this spec produces.
    pub fn tile_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Check the grid parameters independent of any image.
    pub fn validate(&self) -> Result<(), TileError> {
        if self.rows == 0 {
            return Err(TileError::invalid_spec("rows must be at least 1"));
        }
        if self.cols == 0 {
            return Err(TileError::invalid_spec("cols must be at least 1"));
        }
        Ok(())
    }

    /// Check the grid against a concrete image size.
    ///
    /// A grid with more columns than pixels (or rows than pixels) would give
    /// zero-sized base tiles and is rejected.
    pub fn validate_for(&self, width: u32, height: u32) -> Result<(), TileError> {
        self.validate()?;
        if width == 0 || height == 0 {
            return Err(TileError::invalid_spec(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if self.cols > width {
            return Err(TileError::invalid_spec(format!(
                "{} columns exceed image width of {width}px",
                self.cols
            )));
        }
        if self.rows > height {
            return Err(TileError::invalid_spec(format!(
                "{} rows exceed image height of {height}px",
                self.rows
            )));
        }
        Ok(())
    }

    /// Name of the tile at `(row, col)`, 1-based in the name.
    pub fn tile_name(&self, row: u32, col: u32) -> String {
        format!(
            "{}_{}_{}.{}",
            self.name_prefix,
            row + 1,
            col + 1,
            self.format.extension()
        )
    }
}

// =============================================================================
// Tile Rectangles
// =============================================================================

/// Pixel rectangle of one tile within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRect {
    /// Position in row-major generation order
    pub index: usize,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Compute the rectangle of every tile, in row-major order.
///
/// Interior tiles are `base + 2 * overlap` clamped to the image. The last
/// row and column always run to the image edge, so the division remainder
/// lands there (100px in 3 columns gives 33, 33, 34). This deliberately
/// differs from clamping the last tile to `base + 2 * overlap` too, which
/// would drop the remainder pixels.
///
/// # Errors
///
/// Returns [`TileError::InvalidSpec`] if the spec has zero rows or columns or
/// is finer than the image.
pub fn plan(width: u32, height: u32, spec: &GridSpec) -> Result<Vec<TileRect>, TileError> {
    spec.validate_for(width, height)?;

    let tile_width = width / spec.cols;
    let tile_height = height / spec.rows;
    let margin = spec.overlap_px.saturating_mul(2);

    let mut rects = Vec::with_capacity(spec.tile_count());
    for row in 0..spec.rows {
        let y = (row * tile_height).saturating_sub(spec.overlap_px);
        let h = if row + 1 == spec.rows {
            height - y
        } else {
            tile_height.saturating_add(margin).min(height - y)
        };

        for col in 0..spec.cols {
            let x = (col * tile_width).saturating_sub(spec.overlap_px);
            let w = if col + 1 == spec.cols {
                width - x
            } else {
                tile_width.saturating_add(margin).min(width - x)
            };

            rects.push(TileRect {
                index: rects.len(),
                row,
                col,
                x,
                y,
                width: w,
                height: h,
            });
        }
    }

    Ok(rects)
}

// =============================================================================
// Grid Presets
// =============================================================================

/// A `rows x cols` grid shorthand such as `3x3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPreset {
    pub rows: u32,
    pub cols: u32,
}

impl FromStr for GridPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (rows, cols) = lower
            .split_once('x')
            .ok_or_else(|| format!("expected ROWSxCOLS, got '{s}'"))?;

        let rows: u32 = rows
            .trim()
            .parse()
            .map_err(|_| format!("invalid row count in '{s}'"))?;
        let cols: u32 = cols
            .trim()
            .parse()
            .map_err(|_| format!("invalid column count in '{s}'"))?;

        if rows == 0 || cols == 0 {
            return Err(format!("grid '{s}' must have at least one row and column"));
        }

        Ok(GridPreset { rows, cols })
    }
}

impl fmt::Display for GridPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

// =============================================================================
// Tests
// =============================================================================
