//! Tile grid geometry for each zoom level of a pyramid.
//!
//! Zoom level 0 is the source image at full resolution. Each subsequent level
//! halves both dimensions (rounding up), so level `z` has a downscale factor of
//! `2^z`. Every level is cut into a grid of [`TILE_SIZE`] square cells; cells on
//! the right and bottom edges are clipped to the scaled canvas, never padded.
//!
//! Everything here is pure arithmetic. The generator uses it to decide which
//! rectangles to extract and where to write them.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::TilingError;

/// Edge length of a full tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Default highest zoom level generated.
pub const DEFAULT_MAX_ZOOM: u32 = 10;

/// Largest accepted max zoom, the highest level whose `2^zoom` fits a `u64`.
///
/// From zoom 32 on every level of any `u32`-sized image is a single 1x1 tile.
pub const MAX_ZOOM_LIMIT: u32 = 63;

// =============================================================================
// Tile Coordinates
// =============================================================================

/// Address of a single tile within the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub zoom: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u32, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// File name of the tile inside its zoom directory, e.g. `3_1.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.jpg", self.x, self.y)
    }

    /// Path relative to the pyramid root, e.g. `2/3_1.jpg`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.zoom.to_string()).join(self.file_name())
    }

    /// Absolute path of the tile under `root`.
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

/// Pixel rectangle to extract from a scaled canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl TileRect {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

// =============================================================================
// Zoom Grid
// =============================================================================

/// Tile grid of one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomGrid {
    /// Zoom level (0 = full resolution)
    pub zoom: u32,

    /// Downscale factor relative to level 0 (`2^zoom`)
    pub scale: u64,

    /// Width of the scaled canvas in pixels
    pub scaled_width: u32,

    /// Height of the scaled canvas in pixels
    pub scaled_height: u32,

    /// Number of tile columns
    pub tiles_x: u32,

    /// Number of tile rows
    pub tiles_y: u32,
}

impl ZoomGrid {
    /// Compute the grid for `zoom` given the source dimensions.
    ///
    /// Callers must pass positive dimensions; [`plan_pyramid`] checks them.
    /// Zooms past [`MAX_ZOOM_LIMIT`] saturate the scale.
    pub fn new(width: u32, height: u32, zoom: u32) -> Self {
        let scale = 1u64.checked_shl(zoom).unwrap_or(u64::MAX);
        let scaled_width = ceil_div(width as u64, scale) as u32;
        let scaled_height = ceil_div(height as u64, scale) as u32;

        Self {
            zoom,
            scale,
            scaled_width,
            scaled_height,
            tiles_x: ceil_div(scaled_width as u64, TILE_SIZE as u64) as u32,
            tiles_y: ceil_div(scaled_height as u64, TILE_SIZE as u64) as u32,
        }
    }

    /// Total number of tiles on this level.
    pub fn tile_count(&self) -> u64 {
        self.tiles_x as u64 * self.tiles_y as u64
    }

    /// Extraction rectangle for tile `(x, y)`, or `None` outside the grid.
    pub fn tile_rect(&self, x: u32, y: u32) -> Option<TileRect> {
        if x >= self.tiles_x || y >= self.tiles_y {
            return None;
        }

        let left = x * TILE_SIZE;
        let top = y * TILE_SIZE;
        let right = (left + TILE_SIZE).min(self.scaled_width);
        let bottom = (top + TILE_SIZE).min(self.scaled_height);

        Some(TileRect {
            left,
            top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// All tile coordinates of this level, columns outer and rows inner.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let zoom = self.zoom;
        let tiles_y = self.tiles_y;
        (0..self.tiles_x).flat_map(move |x| (0..tiles_y).map(move |y| TileCoord::new(zoom, x, y)))
    }
}

/// Compute the grid of every level from 0 to `max_zoom` inclusive.
pub fn plan_pyramid(width: u32, height: u32, max_zoom: u32) -> Result<Vec<ZoomGrid>, TilingError> {
    if width == 0 || height == 0 {
        return Err(TilingError::EmptySource { width, height });
    }
    if max_zoom > MAX_ZOOM_LIMIT {
        return Err(TilingError::ZoomOutOfRange {
            max_zoom,
            limit: MAX_ZOOM_LIMIT,
        });
    }

    Ok((0..=max_zoom)
        .map(|zoom| ZoomGrid::new(width, height, zoom))
        .collect())
}

#[inline]
fn ceil_div(value: u64, divisor: u64) -> u64 {
    value.div_ceil(divisor)
}

// =============================================================================
// Tests
// =============================================================================
