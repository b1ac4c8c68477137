//! HTTP request handlers for the tile API.
//!
//! # Endpoints
//!
//! - `GET /api/tiles/{dataset}/{layer}/{z}/{x}/{y}` - Serve a generated tile
//! - `GET /api/health` - Health check endpoint
//! - anything else - JSON 404

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::ServeError;
use crate::tile::TileCoord;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the tile handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory holding `{dataset}/{layer}/{z}/{x}_{y}.jpg`
    pub tiles_root: Arc<PathBuf>,

    /// Cache-Control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,
}

impl AppState {
    /// Create a new application state serving tiles from `tiles_root`.
    pub fn new(tiles_root: impl Into<PathBuf>) -> Self {
        Self {
            tiles_root: Arc::new(tiles_root.into()),
            cache_max_age: 3600,
        }
    }

    /// Create a new application state with custom cache max-age.
    pub fn with_cache_max_age(tiles_root: impl Into<PathBuf>, cache_max_age: u32) -> Self {
        Self {
            tiles_root: Arc::new(tiles_root.into()),
            cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from: `/api/tiles/{dataset}/{layer}/{z}/{x}/{filename}`
/// where filename is `{y}` or `{y}.jpg`. Coordinates are kept as strings so
/// that malformed values produce a JSON error rather than a plain rejection.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    /// Dataset name (e.g., "earth")
    pub dataset: String,

    /// Layer name within the dataset (e.g., "landsat")
    pub layer: String,

    /// Zoom level (0 = full resolution)
    pub z: String,

    /// Tile X coordinate
    pub x: String,

    /// Tile Y coordinate with optional .jpg extension
    pub filename: String,
}

impl TilePathParams {
    /// Validate every segment and resolve the tile coordinate.
    pub fn coord(&self) -> Result<TileCoord, ServeError> {
        let y = self
            .filename
            .strip_suffix(".jpg")
            .unwrap_or(&self.filename);

        Ok(TileCoord::new(
            parse_coordinate("z", &self.z)?,
            parse_coordinate("x", &self.x)?,
            parse_coordinate("y", y)?,
        ))
    }

    /// Path of the tile file under `root`.
    pub fn resolve(&self, root: &std::path::Path) -> Result<PathBuf, ServeError> {
        let dataset = validate_segment(&self.dataset)?;
        let layer = validate_segment(&self.layer)?;
        let coord = self.coord()?;

        Ok(coord.path_in(&root.join(dataset).join(layer)))
    }
}

fn parse_coordinate(name: &str, value: &str) -> Result<u32, ServeError> {
    value.parse().map_err(|_| {
        ServeError::InvalidPath(format!(
            "{} must be a non-negative integer, got {:?}",
            name, value
        ))
    })
}

/// Reject names that could address anything outside the tile root.
fn validate_segment(segment: &str) -> Result<&str, ServeError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);

    if invalid {
        return Err(ServeError::InvalidPath(format!(
            "invalid path segment {:?}",
            segment
        )));
    }
    Ok(segment)
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_path")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServeError to HTTP response.
///
/// 404s are logged at DEBUG, other client errors at WARN, server errors at
/// ERROR.
impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ServeError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServeError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "invalid_path"),
            ServeError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle tile requests.
///
/// # Endpoint
///
/// `GET /api/tiles/{dataset}/{layer}/{z}/{x}/{y}`
///
/// # Response
///
/// - `200 OK`: JPEG tile with `Content-Type: image/jpeg`
/// - `400 Bad Request`: Non-numeric coordinates or unsafe dataset/layer names
/// - `404 Not Found`: No tile generated at these coordinates
/// - `500 Internal Server Error`: Filesystem error
pub async fn tile_handler(
    State(state): State<AppState>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, ServeError> {
    let path = params.resolve(&state.tiles_root)?;

    let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ServeError::NotFound(format!(
            "{}/{}/{}",
            params.dataset, params.layer, params.filename
        )),
        _ => ServeError::Io(format!("{}: {}", path.display(), e)),
    })?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )
        .body(axum::body::Body::from(data))
        .map_err(|e| ServeError::Io(e.to_string()))?;

    Ok(response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for unknown routes.
pub async fn not_found_handler(OriginalUri(uri): OriginalUri) -> Response {
    let status = StatusCode::NOT_FOUND;
    let body = ErrorResponse::with_status(
        "not_found",
        format!("Route not found: {}", uri.path()),
        status,
    );
    (status, Json(body)).into_response()
}

// =============================================================================
// Tests
// =============================================================================
