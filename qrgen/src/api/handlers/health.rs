use axum::Json;
use chrono::Utc;

use crate::api::models::HealthResponse;

#[utoipa::path(
    get,
    path = "/qr/health",
    tag = "health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "QR Code Generator API is running".to_string(),
        timestamp: Utc::now(),
    })
}
