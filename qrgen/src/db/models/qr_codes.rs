use chrono::{DateTime, Utc};

use crate::qr::payload::{QrKind, QrPayload};
use crate::types::QrCodeId;

/// Database request for inserting a QR code record.
///
/// Only ever built from validated input, with the image already rendered.
#[derive(Debug, Clone)]
pub struct QrCodeCreateDBRequest {
    pub payload: QrPayload,
    pub size: i32,
    pub margin: i32,
    pub color_dark: String,
    pub color_light: String,
    pub image: String,
}

/// Database response for a stored QR code record
#[derive(Debug, Clone, PartialEq)]
pub struct QrCodeDBResponse {
    pub id: QrCodeId,
    pub payload: QrPayload,
    pub size: i32,
    pub margin: i32,
    pub color_dark: String,
    pub color_light: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl QrCodeDBResponse {
    pub fn kind(&self) -> QrKind {
        self.payload.kind()
    }
}

/// Scalar fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    Kind,
    Size,
    Margin,
    ColorDark,
    ColorLight,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Column name in the `qr_codes` table.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Kind => "kind",
            SortField::Size => "size",
            SortField::Margin => "margin",
            SortField::ColorDark => "color_dark",
            SortField::ColorLight => "color_light",
            SortField::CreatedAt => "created_at",
        }
    }

    /// Parse the wire name of a sortable field.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "id" | "_id" => Some(SortField::Id),
            "type" => Some(SortField::Kind),
            "size" => Some(SortField::Size),
            "margin" => Some(SortField::Margin),
            "colorDark" => Some(SortField::ColorDark),
            "colorLight" => Some(SortField::ColorLight),
            "createdAt" | "generatedAt" => Some(SortField::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filter options for listing QR code records
#[derive(Debug, Clone, Default)]
pub struct QrCodeFilter {
    pub skip: i64,
    pub limit: i64,
    pub kind: Option<QrKind>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl QrCodeFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: QrKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_sort(mut self, sort_by: SortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}
