//! HTTP server layer for Cosmic Atlas.
//!
//! Serves the tile trees written by the pyramid generator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │       GET /api/tiles/{dataset}/{layer}/{z}/{x}/{y}              │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (tile lookup, health)    │  │ (CORS, tracing, fallback)   │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 ▼
//!                 {tiles_root}/{dataset}/{layer}/{z}/{x}_{y}.jpg
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, not_found_handler, tile_handler, AppState, ErrorResponse, HealthResponse,
    TilePathParams,
};
pub use routes::{create_router, RouterConfig};
