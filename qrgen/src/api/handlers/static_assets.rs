//! Fallback for requests that match no API route.
//!
//! Without a configured `frontend.static_dir` every unmatched path is a JSON
//! 404. With one, files are served from that directory and unknown paths get
//! its `index.html` so client-side routing works.

use std::path::Path;

use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tower_http::services::{ServeDir, ServeFile};
use tracing::debug;

pub async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
        })),
    )
}

/// Attach the fallback appropriate for the configured static directory.
///
/// Only covers paths outside `/api`; the API router carries its own JSON fallback.
pub fn with_fallback(router: Router, static_dir: Option<&Path>) -> Router {
    match static_dir {
        Some(dir) => {
            debug!("Serving frontend assets from {}", dir.display());
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            router.fallback_service(spa)
        }
        None => router.fallback(route_not_found),
    }
}
