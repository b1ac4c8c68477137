//! # Cosmic Atlas
//!
//! Tile pyramids for large space imagery.
//!
//! This library splits a source image into a zoom-level pyramid of fixed-size
//! JPEG tiles on disk and serves those tiles to slippy-map and deep-zoom
//! viewers over HTTP.
//!
//! ## Features
//!
//! - **Pyramid generation**: levels `0..=max_zoom`, each halving resolution,
//!   cut into 256x256 tiles with clipped edges
//! - **Bounded worker pool**: tiles render on blocking threads, sequentially by
//!   default or several at once
//! - **Tile server**: Axum-based endpoint serving `{dataset}/{layer}/{z}/{x}_{y}.jpg`
//!
//! ## Architecture
//!
//! - [`tile`] - Grid math, JPEG encoding, and the pyramid generator
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use cosmic_atlas::{GeneratorOptions, PyramidGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let generator = PyramidGenerator::new(GeneratorOptions::default().with_max_zoom(4));
//!
//!     match generator
//!         .generate(Path::new("katrina.jpg"), Path::new("public/tiles/earth/modis"))
//!         .await
//!     {
//!         Ok(summary) => println!("wrote {} tiles", summary.tiles_written),
//!         Err(e) => eprintln!("tiling failed: {}", e),
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod tile;

// Re-export commonly used types
pub use config::{Cli, Command, ServeConfig, TileConfig};
pub use error::{ServeError, TilingError};
pub use server::{
    create_router, health_handler, not_found_handler, tile_handler, AppState, ErrorResponse,
    HealthResponse, RouterConfig, TilePathParams,
};
pub use tile::{
    clamp_quality, create_image_tiles, is_valid_quality, plan_pyramid, GeneratorOptions,
    JpegTileEncoder, PyramidGenerator, RasterMode, TileCoord, TileRect, TilingOutcome,
    TilingSummary, ZoomGrid, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_ZOOM, TILE_SIZE,
};
