//! JPEG tile encoder.
//!
//! Turns one rectangle of a scaled canvas into an encoded JPEG tile.
//!
//! # Design Decisions
//!
//! - **Exact resize**: the source is resampled to exactly the level's scaled
//!   dimensions with a Lanczos3 filter, ignoring aspect-ratio rounding.
//!
//! - **Clip, never pad**: the extracted region is the tile rectangle as given,
//!   so edge tiles come out smaller than [`TILE_SIZE`](super::TILE_SIZE).
//!
//! - **Opaque output**: JPEG has no alpha channel. Sources with alpha or high
//!   bit depth are flattened to 8-bit RGB (or 8-bit luma for gray sources).

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageError, ImageReader};
use std::io::Cursor;

use super::grid::{TileRect, ZoomGrid};

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// JPEG Encoder
// =============================================================================

/// Renders pyramid tiles from a decoded source image.
///
/// # Example
///
/// ```ignore
/// use cosmic_atlas::tile::{JpegTileEncoder, ZoomGrid};
///
/// let encoder = JpegTileEncoder::new(85);
/// let grid = ZoomGrid::new(source.width(), source.height(), 1);
/// let rect = grid.tile_rect(0, 0).unwrap();
/// let jpeg = encoder.render(&source, &grid, rect)?;
/// ```
#[derive(Debug, Clone)]
pub struct JpegTileEncoder {
    quality: u8,
    filter: FilterType,
}

impl Default for JpegTileEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl JpegTileEncoder {
    /// Create an encoder; `quality` is clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
            filter: FilterType::Lanczos3,
        }
    }

    /// The JPEG quality this encoder writes.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Resample the full source to the level's scaled canvas.
    pub fn scale_canvas(&self, source: &DynamicImage, grid: &ZoomGrid) -> DynamicImage {
        source.resize_exact(grid.scaled_width, grid.scaled_height, self.filter)
    }

    /// Resize the source to the level's canvas, extract `rect`, and encode it.
    ///
    /// A level whose canvas already matches the source (level 0) is cropped
    /// directly without resampling.
    pub fn render(
        &self,
        source: &DynamicImage,
        grid: &ZoomGrid,
        rect: TileRect,
    ) -> Result<Bytes, ImageError> {
        if source.width() == grid.scaled_width && source.height() == grid.scaled_height {
            return self.encode_region(source, rect);
        }

        let canvas = self.scale_canvas(source, grid);
        self.encode_region(&canvas, rect)
    }

    /// Extract `rect` from an already scaled canvas and encode it as JPEG.
    pub fn encode_region(&self, canvas: &DynamicImage, rect: TileRect) -> Result<Bytes, ImageError> {
        let tile = canvas.crop_imm(rect.left, rect.top, rect.width, rect.height);
        let tile = jpeg_compatible(tile);

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        encoder.encode_image(&tile)?;

        Ok(Bytes::from(output))
    }

    /// Get image dimensions of an encoded JPEG without fully decoding.
    ///
    /// # Returns
    ///
    /// `(width, height)` in pixels.
    pub fn dimensions(&self, jpeg: &[u8]) -> Result<(u32, u32), ImageError> {
        let reader = ImageReader::with_format(Cursor::new(jpeg), image::ImageFormat::Jpeg);
        reader.into_dimensions()
    }
}

/// Drop alpha and reduce bit depth so the JPEG encoder accepts the pixels.
fn jpeg_compatible(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image,
        ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
