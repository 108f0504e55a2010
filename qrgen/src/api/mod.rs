//! HTTP API layer.
//!
//! All endpoints live under `/api/qr`:
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/api/qr/generate` | [`handlers::qr_codes::generate_qr_code`] |
//! | GET | `/api/qr` | [`handlers::qr_codes::list_qr_codes`] |
//! | GET | `/api/qr/health` | [`handlers::health::health_check`] |
//! | GET | `/api/qr/{id}` | [`handlers::qr_codes::get_qr_code`] |
//! | DELETE | `/api/qr/{id}` | [`handlers::qr_codes::delete_qr_code`] |
//!
//! Successful responses are wrapped in `{success: true, ...}`; errors are
//! `{success: false, error}` (see [`crate::errors::Error`]).

pub mod handlers;
pub mod models;
