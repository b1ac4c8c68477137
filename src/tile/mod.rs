//! Tile pyramid layer.
//!
//! This module turns one source raster into a directory tree of fixed-size
//! JPEG tiles, one subdirectory per zoom level.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            PyramidGenerator             │
//! │  decode source, plan levels, run the    │
//! │  bounded worker pool, write tile files  │
//! └──────────┬──────────────────┬───────────┘
//!            │                  │
//!            ▼                  ▼
//! ┌───────────────────┐  ┌──────────────────┐
//! │     ZoomGrid      │  │ JpegTileEncoder  │
//! │ (scaled canvas,   │  │ (resize → crop → │
//! │  tile rectangles) │  │  JPEG encode)    │
//! └───────────────────┘  └──────────────────┘
//! ```
//!
//! # Layout
//!
//! ```text
//! {output}/0/0_0.jpg    full resolution
//! {output}/0/0_1.jpg
//! {output}/1/0_0.jpg    half resolution
//! ...
//! {output}/{max_zoom}/{x}_{y}.jpg
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use cosmic_atlas::tile::create_image_tiles;
//!
//! #[tokio::main]
//! async fn main() {
//!     let outcome = create_image_tiles(
//!         Path::new("blue_marble.jpg"),
//!         Path::new("public/tiles/earth/landsat"),
//!         5,
//!     )
//!     .await;
//!
//!     if !outcome.success {
//!         eprintln!("tiling failed: {}", outcome.error.unwrap_or_default());
//!     }
//! }
//! ```

mod encoder;
mod generator;
mod grid;

pub use encoder::{
    clamp_quality, is_valid_quality, JpegTileEncoder, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY,
    MIN_JPEG_QUALITY,
};
pub use generator::{
    create_image_tiles, GeneratorOptions, PyramidGenerator, RasterMode, TilingOutcome,
    TilingSummary, DEFAULT_WORKERS,
};
pub use grid::{
    plan_pyramid, TileCoord, TileRect, ZoomGrid, DEFAULT_MAX_ZOOM, MAX_ZOOM_LIMIT, TILE_SIZE,
};
