//! OpenAPI documentation for the `/api` surface.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api::{
    handlers::{health, qr_codes},
    models::{
        ErrorResponse, HealthResponse, MessageResponse,
        pagination::Pagination,
        qr_codes::{QrCodeCreate, QrCodeResponse},
    },
};
use crate::qr::payload::QrKind;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QR Code Generator API",
        description = "Generate QR codes from typed payloads (text, URL, email, phone, WiFi, vCard) and browse the history."
    ),
    servers((url = "/api")),
    paths(
        qr_codes::generate_qr_code,
        qr_codes::list_qr_codes,
        qr_codes::get_qr_code,
        qr_codes::delete_qr_code,
        health::health_check,
    ),
    components(schemas(QrKind, QrCodeCreate, QrCodeResponse, Pagination, MessageResponse, ErrorResponse, HealthResponse)),
    tags(
        (name = "qr", description = "QR code generation and history"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
