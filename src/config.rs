//! Configuration management for Cosmic Atlas.
//!
//! This module provides the command-line interface via clap with two
//! subcommands:
//!
//! - `tile` - generate a tile pyramid from a source image
//! - `serve` - serve generated tile trees over HTTP
//!
//! # Environment Variables
//!
//! - `ATLAS_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5000)
//! - `ATLAS_TILES_ROOT` - Directory tiles are served from (default: public/tiles)
//! - `ATLAS_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `ATLAS_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `ATLAS_JPEG_QUALITY` - Tile JPEG quality (default: 85)
//! - `ATLAS_WORKERS` - Tiles rendered concurrently (default: 1)
//! - `ATLAS_MAX_SOURCE_BYTES` - Allocation cap for decoding the source (default: none)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::tile::{
    is_valid_quality, GeneratorOptions, RasterMode, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_ZOOM,
    DEFAULT_WORKERS, MAX_ZOOM_LIMIT,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory tiles are served from.
pub const DEFAULT_TILES_ROOT: &str = "public/tiles";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Upper bound for the worker pool size.
pub const MAX_WORKERS: usize = 256;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Cosmic Atlas - tile pyramids for large space imagery.
#[derive(Parser, Debug, Clone)]
#[command(name = "cosmic-atlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split a source image into a zoom-level pyramid of JPEG tiles.
    Tile(TileConfig),

    /// Serve generated tiles over HTTP.
    Serve(ServeConfig),
}

// =============================================================================
// Tile Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct TileConfig {
    /// Source image (JPEG or PNG).
    #[arg(short, long)]
    pub source: PathBuf,

    /// Output directory; created if absent.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Highest zoom level to generate (each level halves the resolution).
    #[arg(long, default_value_t = DEFAULT_MAX_ZOOM)]
    pub max_zoom: u32,

    /// JPEG quality for tiles (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "ATLAS_JPEG_QUALITY")]
    pub quality: u8,

    /// Number of tiles rendered concurrently.
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "ATLAS_WORKERS")]
    pub workers: usize,

    /// Allocation cap in bytes for decoding the source image (unlimited if unset).
    #[arg(long, env = "ATLAS_MAX_SOURCE_BYTES")]
    pub max_source_bytes: Option<u64>,

    /// Resize once per zoom level instead of once per tile.
    #[arg(long, default_value_t = false)]
    pub reuse_level_canvas: bool,

    /// Print the result object as JSON on stdout.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl TileConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_zoom > MAX_ZOOM_LIMIT {
            return Err(format!("max_zoom must be at most {}", MAX_ZOOM_LIMIT));
        }

        if !is_valid_quality(self.quality) {
            return Err("quality must be between 1 and 100".to_string());
        }

        if self.max_source_bytes == Some(0) {
            return Err("max_source_bytes must be positive".to_string());
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(format!("workers must be between 1 and {}", MAX_WORKERS));
        }

        if self.source.as_os_str().is_empty() {
            return Err("Source image path is required. Set --source".to_string());
        }

        if self.output.as_os_str().is_empty() {
            return Err("Output directory is required. Set --output".to_string());
        }

        Ok(())
    }

    /// Generator options derived from the command-line flags.
    pub fn generator_options(&self) -> GeneratorOptions {
        let raster_mode = if self.reuse_level_canvas {
            RasterMode::PerLevel
        } else {
            RasterMode::PerTile
        };

        GeneratorOptions::default()
            .with_max_zoom(self.max_zoom)
            .with_quality(self.quality)
            .with_workers(self.workers)
            .with_raster_mode(raster_mode)
            .with_max_source_bytes(self.max_source_bytes)
    }
}

// =============================================================================
// Serve Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ATLAS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Directory holding `{dataset}/{layer}/{z}/{x}_{y}.jpg` tile trees.
    #[arg(long, default_value = DEFAULT_TILES_ROOT, env = "ATLAS_TILES_ROOT")]
    pub tiles_root: PathBuf,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "ATLAS_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "ATLAS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty. Set --host or ATLAS_HOST".to_string());
        }

        if self.tiles_root.as_os_str().is_empty() {
            return Err(
                "Tiles root is required. Set --tiles-root or ATLAS_TILES_ROOT".to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
