use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::api::models::pagination::Pagination;
use crate::db::models::qr_codes::QrCodeDBResponse;
use crate::qr::payload::QrKind;
use crate::types::QrCodeId;

/// Request body for generating a QR code.
///
/// Every field is optional at the wire level so the service can apply defaults
/// and report which one is wrong.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeCreate {
    /// A string for `text`/`url`, an object with the kind's fields otherwise
    #[schema(value_type = Object, example = json!({"ssid": "Home", "encryption": "WPA", "password": "secret", "hidden": false}))]
    pub data: Option<Value>,
    /// One of text, url, email, phone, wifi, vcard (default: text)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Image width and height in pixels, 100 to 1000 (default: 300)
    pub size: Option<i64>,
    /// Quiet zone in modules, 0 to 10 (default: 1)
    pub margin: Option<i64>,
    /// `#RRGGBB` (default: #000000)
    pub color_dark: Option<String>,
    /// `#RRGGBB` (default: #FFFFFF)
    pub color_light: Option<String>,
}

/// Query parameters for listing QR codes.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQrCodesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return QR codes of this kind
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Field to sort by: createdAt (default), type, size, margin, colorDark, colorLight, id
    pub sort_by: Option<String>,

    /// asc or desc (default)
    pub sort_order: Option<String>,
}

/// A stored QR code as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: QrCodeId,
    /// The payload as submitted
    #[schema(value_type = Object)]
    pub data: Value,
    #[serde(rename = "type")]
    pub kind: QrKind,
    pub size: i32,
    pub margin: i32,
    pub color_dark: String,
    pub color_light: String,
    /// `data:image/png;base64,...`
    pub qr_code_image: String,
    pub created_at: DateTime<Utc>,
}

impl From<QrCodeDBResponse> for QrCodeResponse {
    fn from(record: QrCodeDBResponse) -> Self {
        Self {
            id: record.id,
            data: record.payload.to_value(),
            kind: record.kind(),
            size: record.size,
            margin: record.margin,
            color_dark: record.color_dark,
            color_light: record.color_light,
            qr_code_image: record.image,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::payload::QrPayload;
    use serde_json::json;

    #[test]
    fn test_create_request_wire_names() {
        let request: QrCodeCreate = serde_json::from_value(json!({
            "data": "hello",
            "type": "text",
            "size": 250,
            "colorDark": "#112233"
        }))
        .unwrap();
        assert_eq!(request.kind.as_deref(), Some("text"));
        assert_eq!(request.size, Some(250));
        assert_eq!(request.margin, None);
        assert_eq!(request.color_dark.as_deref(), Some("#112233"));
        assert_eq!(request.color_light, None);
    }

    #[test]
    fn test_response_wire_names() {
        let record = QrCodeDBResponse {
            id: uuid::Uuid::new_v4(),
            payload: QrPayload::from_parts(QrKind::Phone, &json!({"phone": "+1 555"})).unwrap(),
            size: 300,
            margin: 1,
            color_dark: "#000000".to_string(),
            color_light: "#FFFFFF".to_string(),
            image: "data:image/png;base64,AAAA".to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(QrCodeResponse::from(record)).unwrap();

        assert_eq!(value["type"], "phone");
        assert_eq!(value["data"], json!({"phone": "+1 555"}));
        assert_eq!(value["qrCodeImage"], "data:image/png;base64,AAAA");
        assert_eq!(value["colorDark"], "#000000");
        assert!(value.get("createdAt").is_some());
    }
}
