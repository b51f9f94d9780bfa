use thiserror::Error;

use crate::tile::OutputFormat;

/// I/O errors that can occur when loading source images or writing tiles
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Source image does not exist
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Reading a source image failed
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// Writing a tile or manifest failed
    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

impl IoError {
    /// Map a `std::io::Error` raised while reading `path`.
    pub fn read(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::NotFound(path)
        } else {
            IoError::Read {
                path,
                message: err.to_string(),
            }
        }
    }

    /// Map a `std::io::Error` raised while writing `path`.
    pub fn write(path: impl Into<String>, err: std::io::Error) -> Self {
        IoError::Write {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors that can occur while partitioning an image into tiles
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Grid parameters are unusable; no work was performed
    #[error("Invalid grid spec: {reason}")]
    InvalidSpec { reason: String },

    /// Source image could not be decoded; no tiles were produced
    #[error("Failed to decode image {image_id}: {message}")]
    ImageDecodeFailure { image_id: String, message: String },

    /// A single tile failed to encode; the whole partition is aborted
    #[error("Failed to encode tile at row {row}, col {col} as {format}: {message}")]
    EncodeFailure {
        row: u32,
        col: u32,
        format: OutputFormat,
        message: String,
    },

    /// I/O error while loading or writing
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,
}

impl TileError {
    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        TileError::InvalidSpec {
            reason: reason.into(),
        }
    }
}
