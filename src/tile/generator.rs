//! Tile pyramid generator.
//!
//! Decodes one source image and writes every tile of zoom levels
//! `0..=max_zoom` to `{output}/{zoom}/{x}_{y}.jpg`.
//!
//! # Execution
//!
//! ```text
//!   decode source ──► plan levels ──► for each zoom:
//!                                        create level directory
//!                                        for each (x, y):
//!                                          wait while `workers` tiles are in flight
//!                                          spawn_blocking: resize → crop → encode → write
//!                                        join the level's remaining tiles
//! ```
//!
//! With the default single worker, tiles are produced strictly in loop order
//! and the first failure stops the run before the next tile starts. With more
//! workers, up to `workers` tiles of one level are in flight at once. A level
//! is finished before the next one starts, so a failure never leaves a
//! directory for a later level behind. On the first failure the pool is shut
//! down: tiles that have not started are aborted and running ones finish.
//! Tiles written before a failure stay on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageReader, Limits};
use serde::Serialize;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::error::TilingError;

use super::encoder::{JpegTileEncoder, DEFAULT_JPEG_QUALITY};
use super::grid::{plan_pyramid, TileCoord, TileRect, ZoomGrid, DEFAULT_MAX_ZOOM};

/// Default number of tiles rendered concurrently.
pub const DEFAULT_WORKERS: usize = 1;

// =============================================================================
// Options
// =============================================================================

/// How the scaled canvas of a zoom level is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterMode {
    /// Resize the full source again for every tile.
    #[default]
    PerTile,

    /// Resize once per zoom level and crop every tile of that level from it.
    PerLevel,
}

/// Settings for a pyramid run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Highest zoom level generated (inclusive)
    pub max_zoom: u32,

    /// JPEG quality for every tile (1-100)
    pub quality: u8,

    /// Maximum number of tiles rendered at once (0 is treated as 1)
    pub workers: usize,

    /// Canvas reuse strategy
    pub raster_mode: RasterMode,

    /// Allocation cap in bytes for decoding the source (None = unlimited)
    pub max_source_bytes: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_MAX_ZOOM,
            quality: DEFAULT_JPEG_QUALITY,
            workers: DEFAULT_WORKERS,
            raster_mode: RasterMode::PerTile,
            max_source_bytes: None,
        }
    }
}

impl GeneratorOptions {
    pub fn with_max_zoom(mut self, max_zoom: u32) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_raster_mode(mut self, raster_mode: RasterMode) -> Self {
        self.raster_mode = raster_mode;
        self
    }

    pub fn with_max_source_bytes(mut self, max_source_bytes: Option<u64>) -> Self {
        self.max_source_bytes = max_source_bytes;
        self
    }
}

// =============================================================================
// Results
// =============================================================================

/// Summary of a successful pyramid run.
///
/// `tiles_x` and `tiles_y` describe the last (coarsest) level only; `levels`
/// carries the grid of every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TilingSummary {
    pub max_zoom: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub levels: Vec<ZoomGrid>,
    pub tiles_written: u64,
}

/// Result object of [`create_image_tiles`]: `{ success, tiles?, error? }`.
#[derive(Debug, Clone, Serialize)]
pub struct TilingOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles: Option<TilingSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TilingOutcome {
    pub fn succeeded(summary: TilingSummary) -> Self {
        Self {
            success: true,
            tiles: Some(summary),
            error: None,
        }
    }

    pub fn failed(err: &TilingError) -> Self {
        Self {
            success: false,
            tiles: None,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<TilingSummary, TilingError>> for TilingOutcome {
    fn from(result: Result<TilingSummary, TilingError>) -> Self {
        match result {
            Ok(summary) => TilingOutcome::succeeded(summary),
            Err(err) => TilingOutcome::failed(&err),
        }
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Generates tile pyramids according to a fixed set of options.
#[derive(Debug, Clone)]
pub struct PyramidGenerator {
    options: GeneratorOptions,
    encoder: JpegTileEncoder,
}

impl Default for PyramidGenerator {
    fn default() -> Self {
        Self::new(GeneratorOptions::default())
    }
}

impl PyramidGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        let encoder = JpegTileEncoder::new(options.quality);
        Self { options, encoder }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate the full pyramid of `source` under `output`.
    ///
    /// `output` and every zoom directory are created if absent. Existing tile
    /// files are overwritten.
    pub async fn generate(&self, source: &Path, output: &Path) -> Result<TilingSummary, TilingError> {
        create_dir(output).await?;

        let image = Arc::new(
            decode_source(source.to_path_buf(), self.options.max_source_bytes).await?,
        );
        let levels = plan_pyramid(image.width(), image.height(), self.options.max_zoom)?;

        info!(
            source = %source.display(),
            width = image.width(),
            height = image.height(),
            max_zoom = self.options.max_zoom,
            workers = self.worker_count(),
            "Generating tile pyramid"
        );

        let mut tasks = JoinSet::new();
        let tiles_written = match self.run_levels(&levels, image, output, &mut tasks).await {
            Ok(written) => written,
            Err(err) => {
                tasks.shutdown().await;
                return Err(err);
            }
        };

        // plan_pyramid always yields level 0
        let last = levels[levels.len() - 1];

        info!(
            output = %output.display(),
            levels = levels.len(),
            tiles = tiles_written,
            "Tile pyramid complete"
        );

        Ok(TilingSummary {
            max_zoom: self.options.max_zoom,
            tiles_x: last.tiles_x,
            tiles_y: last.tiles_y,
            levels,
            tiles_written,
        })
    }

    fn worker_count(&self) -> usize {
        self.options.workers.max(1)
    }

    async fn run_levels(
        &self,
        levels: &[ZoomGrid],
        image: Arc<DynamicImage>,
        output: &Path,
        tasks: &mut JoinSet<Result<TileCoord, TilingError>>,
    ) -> Result<u64, TilingError> {
        let workers = self.worker_count();
        let mut written = 0u64;

        for grid in levels {
            create_dir(&output.join(grid.zoom.to_string())).await?;
            let raster = self.level_raster(&image, grid).await?;

            info!(
                zoom = grid.zoom,
                width = grid.scaled_width,
                height = grid.scaled_height,
                tiles_x = grid.tiles_x,
                tiles_y = grid.tiles_y,
                "Generating zoom level"
            );

            for coord in grid.coords() {
                while tasks.len() >= workers {
                    if let Some(joined) = tasks.join_next().await {
                        joined_tile(joined)?;
                        written += 1;
                    }
                }

                // coords() only yields cells inside the grid
                let Some(rect) = grid.tile_rect(coord.x, coord.y) else {
                    continue;
                };

                let job = TileJob {
                    coord,
                    grid: *grid,
                    rect,
                    path: coord.path_in(output),
                    raster: Arc::clone(&raster),
                    encoder: self.encoder.clone(),
                };

                tasks.spawn_blocking(move || job.run());
            }

            while let Some(joined) = tasks.join_next().await {
                joined_tile(joined)?;
                written += 1;
            }
        }

        Ok(written)
    }

    /// Raster the tiles of `grid` are rendered from.
    async fn level_raster(
        &self,
        image: &Arc<DynamicImage>,
        grid: &ZoomGrid,
    ) -> Result<Arc<DynamicImage>, TilingError> {
        let already_scaled =
            image.width() == grid.scaled_width && image.height() == grid.scaled_height;

        if self.options.raster_mode == RasterMode::PerTile || already_scaled {
            return Ok(Arc::clone(image));
        }

        let source = Arc::clone(image);
        let encoder = self.encoder.clone();
        let grid = *grid;
        let canvas = tokio::task::spawn_blocking(move || encoder.scale_canvas(&source, &grid))
            .await
            .map_err(|e| TilingError::Worker(e.to_string()))?;

        Ok(Arc::new(canvas))
    }
}

// =============================================================================
// Tile Jobs
// =============================================================================

/// One unit of work: render and write a single tile.
struct TileJob {
    coord: TileCoord,
    grid: ZoomGrid,
    rect: TileRect,
    path: PathBuf,
    raster: Arc<DynamicImage>,
    encoder: JpegTileEncoder,
}

impl TileJob {
    fn run(self) -> Result<TileCoord, TilingError> {
        let jpeg = self
            .encoder
            .render(&self.raster, &self.grid, self.rect)
            .map_err(|e| TilingError::Encode {
                zoom: self.coord.zoom,
                x: self.coord.x,
                y: self.coord.y,
                message: e.to_string(),
            })?;

        std::fs::write(&self.path, &jpeg).map_err(|e| TilingError::io(&self.path, e))?;

        Ok(self.coord)
    }
}

fn joined_tile(
    joined: Result<Result<TileCoord, TilingError>, JoinError>,
) -> Result<TileCoord, TilingError> {
    let coord = joined.map_err(|e| TilingError::Worker(e.to_string()))??;
    debug!(zoom = coord.zoom, x = coord.x, y = coord.y, "Tile written");
    Ok(coord)
}

async fn create_dir(path: &Path) -> Result<(), TilingError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| TilingError::io(path, e))
}

/// Decode the source image, sniffing the format from its contents.
///
/// Full-size planetary mosaics exceed the decoder's default allocation cap,
/// so only `max_bytes` bounds the decode.
async fn decode_source(path: PathBuf, max_bytes: Option<u64>) -> Result<DynamicImage, TilingError> {
    tokio::task::spawn_blocking(move || {
        let unreadable = |message: String| TilingError::SourceUnreadable {
            path: path.clone(),
            message,
        };

        let mut reader = ImageReader::open(&path)
            .map_err(|e| unreadable(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| unreadable(e.to_string()))?;

        match max_bytes {
            Some(bytes) => {
                let mut limits = Limits::no_limits();
                limits.max_alloc = Some(bytes);
                reader.limits(limits);
            }
            None => reader.no_limits(),
        }

        reader.decode().map_err(|e| unreadable(e.to_string()))
    })
    .await
    .map_err(|e| TilingError::Worker(e.to_string()))?
}

// =============================================================================
// Convenience Entry Point
// =============================================================================

/// Generate a pyramid with default settings and report the result as an
/// outcome object instead of an error.
///
/// Failures are logged and returned with `success: false` and a message.
pub async fn create_image_tiles(source: &Path, output: &Path, max_zoom: u32) -> TilingOutcome {
    let generator = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(max_zoom));

    match generator.generate(source, output).await {
        Ok(summary) => TilingOutcome::succeeded(summary),
        Err(err) => {
            error!(source = %source.display(), "Error creating tiles: {}", err);
            TilingOutcome::failed(&err)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
