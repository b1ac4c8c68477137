//! Cosmic Atlas - tile pyramid generator and tile server.
//!
//! This binary dispatches the `tile` and `serve` subcommands.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cosmic_atlas::{
    config::{Cli, Command, ServeConfig, TileConfig},
    server::{create_router, RouterConfig},
    tile::{PyramidGenerator, TilingOutcome},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Tile(config) => run_tile(config).await,
        Command::Serve(config) => run_serve(config).await,
    }
}

// =============================================================================
// Tile Command
// =============================================================================

async fn run_tile(config: TileConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let generator = PyramidGenerator::new(config.generator_options());

    info!("Source: {}", config.source.display());
    info!("Output: {}", config.output.display());
    info!(
        "Zoom levels 0-{}, quality {}, {} worker(s), raster mode {:?}",
        config.max_zoom,
        config.quality,
        config.workers,
        generator.options().raster_mode
    );

    let result = generator.generate(&config.source, &config.output).await;
    if let Err(ref e) = result {
        error!("Error creating tiles: {}", e);
    }
    let outcome = TilingOutcome::from(result);

    if config.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize result: {}", e),
        }
    } else if let Some(ref summary) = outcome.tiles {
        for level in &summary.levels {
            info!(
                "  zoom {:>2}: {:>6}x{:<6} {:>4}x{:<4} tiles",
                level.zoom, level.scaled_width, level.scaled_height, level.tiles_x, level.tiles_y
            );
        }
        info!("Wrote {} tiles", summary.tiles_written);
    }

    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Cosmic Atlas v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Tiles root: {}", config.tiles_root.display());
    info!("  Cache max-age: {}s", config.cache_max_age);

    if !config.tiles_root.is_dir() {
        warn!(
            "  Tiles root {} does not exist yet - every tile request will 404",
            config.tiles_root.display()
        );
    }

    let router = create_router(build_router_config(&config));
    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/api/health", addr);
    info!("    curl http://{}/api/tiles/<dataset>/<layer>/0/0/0", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config =
        RouterConfig::new(config.tiles_root.clone()).with_cache_max_age(config.cache_max_age);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "cosmic_atlas=debug,tower_http=debug"
    } else {
        "cosmic_atlas=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
