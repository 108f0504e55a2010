//! HTTP request handlers, mounted under `/api`.
//!
//! - [`qr_codes`]: generate, list, fetch and delete QR codes
//! - [`health`]: service health check
//! - [`static_assets`]: 404 and single-page client fallback

pub mod health;
pub mod qr_codes;
pub mod static_assets;
