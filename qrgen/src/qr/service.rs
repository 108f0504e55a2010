//! Record service: validate, format, encode, persist, list, delete.
//!
//! A QR code is created in one pass: the request is validated and defaulted,
//! the payload is formatted and length-checked, the image is rendered with a
//! single encoder call and the record is written with a single insert. Nothing
//! reaches the store if any earlier step fails.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::models::qr_codes::{ListQrCodesQuery, QrCodeCreate};
use crate::config::QrConfig;
use crate::db::models::qr_codes::{QrCodeCreateDBRequest, QrCodeDBResponse, QrCodeFilter, SortField, SortOrder};
use crate::db::store::RecordStore;
use crate::errors::{Error, Result};
use crate::qr::encoder::{QrEncoder, RenderOptions, parse_hex_color};
use crate::qr::payload::{QrKind, QrPayload};
use crate::types::{abbrev_uuid, parse_id};

pub const SIZE_RANGE: std::ops::RangeInclusive<i64> = 100..=1000;
pub const MARGIN_RANGE: std::ops::RangeInclusive<i64> = 0..=10;

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<QrCodeDBResponse>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
}

/// A creation request after defaults and validation.
#[derive(Debug)]
struct ValidatedCreate {
    payload: QrPayload,
    options: RenderOptions,
}

pub struct QrCodeService {
    store: Arc<dyn RecordStore>,
    encoder: Arc<dyn QrEncoder>,
    config: QrConfig,
}

impl QrCodeService {
    pub fn new(store: Arc<dyn RecordStore>, encoder: Arc<dyn QrEncoder>, config: QrConfig) -> Self {
        Self { store, encoder, config }
    }

    pub fn config(&self) -> &QrConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(kind = ?request.kind), err)]
    pub async fn create(&self, request: &QrCodeCreate) -> Result<QrCodeDBResponse> {
        let ValidatedCreate { payload, options } = validate_create(request)?;

        let text = payload.to_encodable_string();
        let length = text.chars().count();
        if length == 0 {
            return Err(Error::bad_request("QR code data is required"));
        }
        if length > self.config.max_payload_length {
            return Err(Error::bad_request(format!(
                "QR code data is too long (max {} characters)",
                self.config.max_payload_length
            )));
        }

        let image = self.encoder.encode(&text, &options).await?;

        let record = self
            .store
            .insert(&QrCodeCreateDBRequest {
                payload,
                size: options.size as i32,
                margin: options.margin as i32,
                color_dark: options.color_dark,
                color_light: options.color_light,
                image,
            })
            .await?;

        info!(qr_code_id = %abbrev_uuid(&record.id), kind = %record.kind(), "Generated QR code");
        Ok(record)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&self, id: &str) -> Result<QrCodeDBResponse> {
        let not_found = || Error::qr_code_not_found(id);
        let uuid = parse_id(id).ok_or_else(not_found)?;
        self.store.find_by_id(uuid).await?.ok_or_else(not_found)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let uuid = parse_id(id).ok_or_else(|| Error::qr_code_not_found(id))?;
        if self.store.delete_one(uuid).await? == 0 {
            return Err(Error::qr_code_not_found(id));
        }

        info!(qr_code_id = %abbrev_uuid(&uuid), "Deleted QR code");
        Ok(())
    }

    #[instrument(skip(self, query), fields(page = ?query.pagination.page, limit = ?query.pagination.limit), err)]
    pub async fn list(&self, query: &ListQrCodesQuery) -> Result<RecordPage> {
        let page = query.pagination.page.unwrap_or(1);
        if page < 1 {
            return Err(Error::bad_request("\"page\" must be greater than or equal to 1"));
        }

        let limit = query.pagination.limit.unwrap_or(self.config.default_page_size);
        if limit < 1 {
            return Err(Error::bad_request("\"limit\" must be greater than or equal to 1"));
        }
        let limit = limit.min(self.config.max_page_size);

        let sort_by = match non_blank(&query.sort_by) {
            None => SortField::default(),
            Some(name) => SortField::from_wire(name).ok_or_else(|| {
                Error::bad_request(format!(
                    "\"sortBy\" must be one of [createdAt, type, size, margin, colorDark, colorLight, id], got \"{name}\""
                ))
            })?,
        };
        let sort_order = match non_blank(&query.sort_order) {
            None => SortOrder::default(),
            Some(name) => SortOrder::from_wire(name)
                .ok_or_else(|| Error::bad_request(format!("\"sortOrder\" must be one of [asc, desc], got \"{name}\"")))?,
        };

        let skip = (page - 1).saturating_mul(limit);
        let mut filter = QrCodeFilter::new(skip, limit).with_sort(sort_by, sort_order);
        if let Some(kind) = non_blank(&query.kind) {
            filter = filter.with_kind(kind.parse::<QrKind>()?);
        }

        let records = self.store.find(&filter).await?;
        let total_count = self.store.count(&filter).await?;

        Ok(RecordPage {
            records,
            total_count,
            total_pages: crate::api::models::pagination::total_pages(total_count, limit),
            current_page: page,
            limit,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validate_create(request: &QrCodeCreate) -> Result<ValidatedCreate> {
    let kind = match non_blank(&request.kind) {
        None => QrKind::default(),
        Some(name) => name.parse::<QrKind>()?,
    };

    let size = request.size.unwrap_or(300);
    if !SIZE_RANGE.contains(&size) {
        return Err(Error::bad_request(format!(
            "\"size\" must be between {} and {}",
            SIZE_RANGE.start(),
            SIZE_RANGE.end()
        )));
    }

    let margin = request.margin.unwrap_or(1);
    if !MARGIN_RANGE.contains(&margin) {
        return Err(Error::bad_request(format!(
            "\"margin\" must be between {} and {}",
            MARGIN_RANGE.start(),
            MARGIN_RANGE.end()
        )));
    }

    let color = |field: &str, value: &Option<String>, default: &str| -> Result<String> {
        let value = value.clone().unwrap_or_else(|| default.to_string());
        if parse_hex_color(&value).is_none() {
            return Err(Error::bad_request(format!("\"{field}\" must be a hex color like #000000, got \"{value}\"")));
        }
        Ok(value)
    };
    let color_dark = color("colorDark", &request.color_dark, "#000000")?;
    let color_light = color("colorLight", &request.color_light, "#FFFFFF")?;

    let data = match &request.data {
        None | Some(serde_json::Value::Null) => return Err(Error::bad_request("QR code data is required")),
        Some(data) => data,
    };
    let payload = QrPayload::from_parts(kind, data)?;

    Ok(ValidatedCreate {
        payload,
        options: RenderOptions {
            size: size as u32,
            margin: margin as u32,
            color_dark,
            color_light,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::pagination::Pagination;
    use crate::db::store::InMemoryRecordStore;
    use crate::qr::encoder::PngQrEncoder;
    use crate::test_utils::FailingEncoder;
    use axum::http::StatusCode;
    use serde_json::json;

    fn service_with(store: InMemoryRecordStore) -> QrCodeService {
        QrCodeService::new(Arc::new(store), Arc::new(PngQrEncoder::default()), QrConfig::default())
    }

    fn text_request(text: &str) -> QrCodeCreate {
        QrCodeCreate {
            data: Some(json!(text)),
            kind: Some("text".to_string()),
            ..Default::default()
        }
    }

    fn list_query(page: Option<i64>, limit: Option<i64>) -> ListQrCodesQuery {
        ListQrCodesQuery {
            pagination: Pagination { page, limit },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults_and_persists() {
        let store = InMemoryRecordStore::new();
        let service = service_with(store.clone());

        let record = service.create(&text_request("hello world")).await.unwrap();

        assert_eq!(record.kind(), QrKind::Text);
        assert_eq!(record.size, 300);
        assert_eq!(record.margin, 1);
        assert_eq!(record.color_dark, "#000000");
        assert_eq!(record.color_light, "#FFFFFF");
        assert!(record.image.starts_with("data:image/png;base64,"));
        assert!(record.image.len() > "data:image/png;base64,".len());
        assert_eq!(store.len(), 1);
        assert_eq!(service.get_by_id(&record.id.to_string()).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_create_structured_kind() {
        let service = service_with(InMemoryRecordStore::new());
        let request = QrCodeCreate {
            data: Some(json!({"ssid": "Home", "encryption": "WPA", "password": "secret", "hidden": false})),
            kind: Some("wifi".to_string()),
            size: Some(200),
            margin: Some(0),
            color_dark: Some("#112233".to_string()),
            color_light: Some("#ffffff".to_string()),
        };

        let record = service.create(&request).await.unwrap();
        assert_eq!(record.kind(), QrKind::Wifi);
        assert_eq!(record.payload.to_encodable_string(), "WIFI:S:Home;T:WPA;P:secret;H:false;;");
        assert_eq!(record.size, 200);
        assert_eq!(record.margin, 0);
        assert_eq!(record.color_light, "#ffffff");
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let store = InMemoryRecordStore::new();
        let service = service_with(store.clone());

        for request in [
            text_request(""),
            text_request("   "),
            QrCodeCreate {
                kind: Some("text".to_string()),
                ..Default::default()
            },
        ] {
            let err = service.create(&request).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.user_message(), "QR code data is required");
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_too_long_text_is_rejected() {
        let store = InMemoryRecordStore::new();
        let service = service_with(store.clone());

        let err = service.create(&text_request(&"a".repeat(4001))).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.user_message(), "QR code data is too long (max 4000 characters)");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_length_limit_counts_formatted_payload() {
        let config = QrConfig {
            max_payload_length: 20,
            ..Default::default()
        };
        let service = QrCodeService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(PngQrEncoder::default()),
            config,
        );
        // 17 characters of input, but "tel:" pushes it to 21 once formatted
        let request = QrCodeCreate {
            data: Some(json!({"phone": "12345678901234567"})),
            kind: Some("phone".to_string()),
            ..Default::default()
        };
        let err = service.create(&request).await.unwrap_err();
        assert_eq!(err.user_message(), "QR code data is too long (max 20 characters)");
    }

    #[tokio::test]
    async fn test_invalid_render_options_are_rejected() {
        let service = service_with(InMemoryRecordStore::new());

        let cases = [
            (
                QrCodeCreate {
                    size: Some(99),
                    ..text_request("x")
                },
                "size",
            ),
            (
                QrCodeCreate {
                    size: Some(1001),
                    ..text_request("x")
                },
                "size",
            ),
            (
                QrCodeCreate {
                    margin: Some(11),
                    ..text_request("x")
                },
                "margin",
            ),
            (
                QrCodeCreate {
                    color_dark: Some("black".to_string()),
                    ..text_request("x")
                },
                "colorDark",
            ),
            (
                QrCodeCreate {
                    color_light: Some("#FFF".to_string()),
                    ..text_request("x")
                },
                "colorLight",
            ),
            (
                QrCodeCreate {
                    kind: Some("barcode".to_string()),
                    ..text_request("x")
                },
                "type",
            ),
        ];

        for (request, field) in cases {
            let err = service.create(&request).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{field}");
            assert!(err.user_message().contains(field), "{} should mention {field}", err.user_message());
        }
    }

    #[tokio::test]
    async fn test_missing_structured_field_is_named() {
        let service = service_with(InMemoryRecordStore::new());
        let request = QrCodeCreate {
            data: Some(json!({"firstName": "Jane"})),
            kind: Some("vcard".to_string()),
            ..Default::default()
        };
        let err = service.create(&request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.user_message().contains("lastName"));
    }

    #[tokio::test]
    async fn test_encoder_failure_persists_nothing() {
        let store = InMemoryRecordStore::new();
        let service = QrCodeService::new(Arc::new(store.clone()), Arc::new(FailingEncoder), QrConfig::default());

        let err = service.create(&text_request("hello")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, Error::Dependency { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_or_malformed_id_is_not_found() {
        let service = service_with(InMemoryRecordStore::new());

        let err = service.get_by_id(&uuid::Uuid::new_v4().to_string()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = service.get_by_id("not-a-uuid").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "QR code not found");
    }

    #[tokio::test]
    async fn test_double_delete_is_not_found() {
        let service = service_with(InMemoryRecordStore::new());
        let record = service.create(&text_request("bye")).await.unwrap();
        let id = record.id.to_string();

        service.delete(&id).await.unwrap();
        let err = service.delete(&id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = service.delete(&uuid::Uuid::new_v4().to_string()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let service = service_with(InMemoryRecordStore::new());
        for i in 0..5 {
            service.create(&text_request(&format!("item {i}"))).await.unwrap();
        }

        let page = service.list(&list_query(Some(2), Some(10))).await.unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 2);

        let page = service.list(&list_query(None, None)).await.unwrap();
        assert_eq!(page.records.len(), 5);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.limit, 10);
    }

    #[tokio::test]
    async fn test_limit_is_clamped_and_validated() {
        let service = service_with(InMemoryRecordStore::new());

        let page = service.list(&list_query(Some(1), Some(1000))).await.unwrap();
        assert_eq!(page.limit, 100);

        for (page, limit) in [(Some(0), None), (Some(-1), None), (None, Some(0))] {
            let err = service.list(&list_query(page, limit)).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort_and_kind() {
        let service = service_with(InMemoryRecordStore::new());

        for query in [
            ListQrCodesQuery {
                sort_by: Some("qrCodeImage".to_string()),
                ..Default::default()
            },
            ListQrCodesQuery {
                sort_order: Some("sideways".to_string()),
                ..Default::default()
            },
            ListQrCodesQuery {
                kind: Some("barcode".to_string()),
                ..Default::default()
            },
        ] {
            let err = service.list(&query).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_list_sorted_by_created_at_ascending() {
        let service = service_with(InMemoryRecordStore::new());
        for i in 0..6 {
            service.create(&text_request(&format!("item {i}"))).await.unwrap();
        }

        let query = ListQrCodesQuery {
            sort_by: Some("createdAt".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let page = service.list(&query).await.unwrap();
        assert_eq!(page.records.len(), 6);
        for pair in page.records.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
            if pair[0].created_at == pair[1].created_at {
                assert!(pair[0].id < pair[1].id);
            }
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let service = service_with(InMemoryRecordStore::new());
        service.create(&text_request("a")).await.unwrap();
        service
            .create(&QrCodeCreate {
                data: Some(json!("https://example.com")),
                kind: Some("url".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let query = ListQrCodesQuery {
            kind: Some("url".to_string()),
            ..Default::default()
        };
        let page = service.list(&query).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.records[0].kind(), QrKind::Url);

        // An empty filter means "all kinds"
        let query = ListQrCodesQuery {
            kind: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(service.list(&query).await.unwrap().total_count, 2);
    }
}
