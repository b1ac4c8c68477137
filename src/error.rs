use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while generating a tile pyramid
#[derive(Debug, Clone, Error)]
pub enum TilingError {
    /// Source image is missing, unreadable, or not decodable
    #[error("Cannot read source image {path}: {message}")]
    SourceUnreadable { path: PathBuf, message: String },

    /// Source image decoded to an empty raster
    #[error("Source image has invalid dimensions {width}x{height}")]
    EmptySource { width: u32, height: u32 },

    /// Requested zoom range exceeds what the pixel domain can represent
    #[error("Max zoom {max_zoom} out of range (limit is {limit})")]
    ZoomOutOfRange { max_zoom: u32, limit: u32 },

    /// Filesystem error creating a directory or writing a tile
    #[error("I/O error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Resize, extract, or JPEG encode failed for a tile
    #[error("Failed to encode tile {zoom}/{x}_{y}: {message}")]
    Encode {
        zoom: u32,
        x: u32,
        y: u32,
        message: String,
    },

    /// A worker task panicked or was cancelled
    #[error("Tile worker failed: {0}")]
    Worker(String),
}

impl TilingError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        TilingError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors that can occur when serving a tile over HTTP
#[derive(Debug, Clone, Error)]
pub enum ServeError {
    /// No tile file exists for the requested coordinates
    #[error("Tile not found: {0}")]
    NotFound(String),

    /// A path segment is empty, non-numeric, or would escape the tile root
    #[error("Invalid tile path: {0}")]
    InvalidPath(String),

    /// Any other filesystem failure while reading a tile
    #[error("I/O error: {0}")]
    Io(String),
}
