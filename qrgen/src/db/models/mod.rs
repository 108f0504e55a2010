//! Database record models.
//!
//! These are the shapes the store layer accepts and returns. They are distinct
//! from the API models in [`crate::api::models`] so storage and wire
//! representations can evolve independently.
//!
//! - [`qr_codes`]: generated QR code records

pub mod qr_codes;
