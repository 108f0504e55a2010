//! Rendering of encodable strings into PNG data URLs.
//!
//! The bit matrix comes from the `qrcode` crate and is rasterised here so the
//! output is exactly `size` pixels square regardless of the symbol version,
//! with `margin` quiet-zone modules on every side.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;
use tracing::instrument;

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("cannot encode an empty string")]
    Empty,

    #[error("data cannot be encoded as a QR code: {0}")]
    Capacity(String),

    #[error("invalid color {0}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("failed to render QR code image: {0}")]
    Render(String),
}

/// Reed-Solomon error correction level of the generated symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    #[serde(alias = "l", alias = "low")]
    L,
    #[default]
    #[serde(alias = "m", alias = "medium")]
    M,
    #[serde(alias = "q", alias = "quartile")]
    Q,
    #[serde(alias = "h", alias = "high")]
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Visual parameters for a single render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Width and height of the output image in pixels
    pub size: u32,
    /// Quiet zone width in modules
    pub margin: u32,
    pub color_dark: String,
    pub color_light: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: 300,
            margin: 1,
            color_dark: "#000000".to_string(),
            color_light: "#FFFFFF".to_string(),
        }
    }
}

/// Parse a `#RRGGBB` color, case-insensitively.
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Turns an encodable string into a rendered image.
#[async_trait]
pub trait QrEncoder: Send + Sync {
    /// Returns the image as a `data:image/png;base64,...` URL.
    async fn encode(&self, text: &str, options: &RenderOptions) -> Result<String, EncodeError>;
}

/// PNG encoder backed by the `qrcode` and `image` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngQrEncoder {
    ec_level: ErrorCorrection,
}

impl PngQrEncoder {
    pub fn new(ec_level: ErrorCorrection) -> Self {
        Self { ec_level }
    }
}

#[async_trait]
impl QrEncoder for PngQrEncoder {
    #[instrument(skip(self, text), fields(len = text.len(), size = options.size), err)]
    async fn encode(&self, text: &str, options: &RenderOptions) -> Result<String, EncodeError> {
        if text.is_empty() {
            return Err(EncodeError::Empty);
        }
        let text = text.to_owned();
        let options = options.clone();
        let ec_level = self.ec_level;

        let png = tokio::task::spawn_blocking(move || render_png(&text, &options, ec_level))
            .await
            .map_err(|e| EncodeError::Render(e.to_string()))??;

        Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(png)))
    }
}

fn render_png(text: &str, options: &RenderOptions, ec_level: ErrorCorrection) -> Result<Vec<u8>, EncodeError> {
    let dark = parse_hex_color(&options.color_dark).ok_or_else(|| EncodeError::InvalidColor(options.color_dark.clone()))?;
    let light = parse_hex_color(&options.color_light).ok_or_else(|| EncodeError::InvalidColor(options.color_light.clone()))?;
    if options.size == 0 {
        return Err(EncodeError::Render("image size must be positive".to_string()));
    }

    let code = QrCode::with_error_correction_level(text.as_bytes(), ec_level.into()).map_err(|e| EncodeError::Capacity(e.to_string()))?;
    let width = code.width() as u64;
    let modules = code.to_colors();
    let margin = u64::from(options.margin);
    let total = width + 2 * margin;
    let size = u64::from(options.size);

    // Nearest-neighbour mapping from output pixel to module, quiet zone included.
    let module_at = |px: u32| -> Option<u64> {
        let m = u64::from(px) * total / size;
        (m >= margin && m < margin + width).then(|| m - margin)
    };

    let image = RgbImage::from_fn(options.size, options.size, |x, y| match (module_at(x), module_at(y)) {
        (Some(mx), Some(my)) if modules[(my * width + mx) as usize] == Color::Dark => Rgb(dark),
        _ => Rgb(light),
    });

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| EncodeError::Render(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data_url: &str) -> RgbImage {
        let b64 = data_url.strip_prefix(DATA_URL_PREFIX).expect("data URL prefix");
        let bytes = STANDARD.decode(b64).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap().to_rgb8()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#000000"), Some([0, 0, 0]));
        assert_eq!(parse_hex_color("#ffFFff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("#1a2B3c"), Some([0x1a, 0x2b, 0x3c]));
        assert_eq!(parse_hex_color("000000"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color("#12345678"), None);
    }

    #[tokio::test]
    async fn test_renders_png_of_requested_size() {
        let encoder = PngQrEncoder::default();
        let options = RenderOptions {
            size: 250,
            ..Default::default()
        };
        let url = encoder.encode("https://example.com", &options).await.unwrap();
        assert!(url.starts_with(DATA_URL_PREFIX));

        let image = decode(&url);
        assert_eq!(image.dimensions(), (250, 250));
        // Quiet zone in the corner, finder pattern a little further in.
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert!(image.pixels().any(|p| *p == Rgb([0, 0, 0])));
    }

    #[tokio::test]
    async fn test_custom_colors_without_margin() {
        let encoder = PngQrEncoder::new(ErrorCorrection::H);
        let options = RenderOptions {
            size: 100,
            margin: 0,
            color_dark: "#FF0000".to_string(),
            color_light: "#00ff00".to_string(),
        };
        let image = decode(&encoder.encode("hello", &options).await.unwrap());
        // Top-left module of the finder pattern is always dark.
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert!(image.pixels().all(|p| *p == Rgb([255, 0, 0]) || *p == Rgb([0, 255, 0])));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let err = PngQrEncoder::default().encode("", &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(err, EncodeError::Empty));
    }

    #[tokio::test]
    async fn test_data_over_capacity_is_rejected() {
        let text = "a".repeat(3000);
        let err = PngQrEncoder::default().encode(&text, &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(err, EncodeError::Capacity(_)));
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let options = RenderOptions {
            color_dark: "black".to_string(),
            ..Default::default()
        };
        let err = PngQrEncoder::default().encode("hi", &options).await.unwrap_err();
        assert!(matches!(err, EncodeError::InvalidColor(_)));
    }

    #[test]
    fn test_error_correction_deserializes_from_aliases() {
        let level: ErrorCorrection = serde_json::from_str("\"q\"").unwrap();
        assert_eq!(level, ErrorCorrection::Q);
        let level: ErrorCorrection = serde_json::from_str("\"H\"").unwrap();
        assert_eq!(level, ErrorCorrection::H);
        assert_eq!(ErrorCorrection::default(), ErrorCorrection::M);
    }
}
