//! QR code domain logic.
//!
//! - [`payload`]: typed payloads and their canonical encodable strings
//! - [`encoder`]: rendering an encodable string to a PNG data URL
//! - [`service`]: the record service tying validation, encoding and storage together

pub mod encoder;
pub mod payload;
pub mod service;

pub use encoder::{PngQrEncoder, QrEncoder, RenderOptions};
pub use payload::{QrKind, QrPayload, format_payload};
pub use service::QrCodeService;
