//! Typed QR payloads and their canonical encodable strings.
//!
//! Each [`QrKind`] has a well-known textual convention that standard QR readers
//! recognise (`mailto:`, `tel:`, `WIFI:`, vCard 3.0). A [`QrPayload`] carries
//! only the fields its kind needs, and [`QrPayload::to_encodable_string`] turns
//! it into the exact string handed to the encoder.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use thiserror::Error;
use utoipa::ToSchema;

/// The closed set of payload semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QrKind {
    #[default]
    Text,
    Url,
    Email,
    Phone,
    Wifi,
    Vcard,
}

impl QrKind {
    pub const ALL: [QrKind; 6] = [
        QrKind::Text,
        QrKind::Url,
        QrKind::Email,
        QrKind::Phone,
        QrKind::Wifi,
        QrKind::Vcard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QrKind::Text => "text",
            QrKind::Url => "url",
            QrKind::Email => "email",
            QrKind::Phone => "phone",
            QrKind::Wifi => "wifi",
            QrKind::Vcard => "vcard",
        }
    }
}

impl fmt::Display for QrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrKind {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QrKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PayloadError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("\"type\" must be one of [text, url, email, phone, wifi, vcard], got \"{0}\"")]
    UnknownKind(String),

    #[error("\"{field}\" is required for {kind} QR codes")]
    MissingField { kind: QrKind, field: &'static str },

    #[error("\"{field}\" must be {expected} for {kind} QR codes")]
    InvalidField {
        kind: QrKind,
        field: &'static str,
        expected: &'static str,
    },

    #[error("data must be {expected} for {kind} QR codes")]
    InvalidShape { kind: QrKind, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPayload {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhonePayload {
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiPayload {
    pub ssid: String,
    pub encryption: String,
    pub password: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VCardPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A validated payload, one variant per [`QrKind`].
///
/// Serializes to the same shape it was submitted in: a bare string for text and
/// url, an object with camelCase fields for the structured kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QrPayload {
    Text(String),
    Url(String),
    Email(EmailPayload),
    Phone(PhonePayload),
    Wifi(WifiPayload),
    Vcard(VCardPayload),
}

impl QrPayload {
    /// Build a typed payload from submitted JSON.
    ///
    /// Plain strings are trimmed. Identity fields (email address, phone number,
    /// ssid, names) must be present and non-blank; nothing is defaulted for them.
    pub fn from_parts(kind: QrKind, data: &Value) -> Result<Self, PayloadError> {
        match kind {
            QrKind::Text => Ok(QrPayload::Text(plain_string(kind, data)?)),
            QrKind::Url => Ok(QrPayload::Url(plain_string(kind, data)?)),
            QrKind::Email => {
                let fields = object(kind, data)?;
                Ok(QrPayload::Email(EmailPayload {
                    email: required(kind, fields, "email")?,
                    subject: optional(kind, fields, "subject")?,
                    body: optional(kind, fields, "body")?,
                }))
            }
            QrKind::Phone => {
                let fields = object(kind, data)?;
                Ok(QrPayload::Phone(PhonePayload {
                    phone: required(kind, fields, "phone")?,
                }))
            }
            QrKind::Wifi => {
                let fields = object(kind, data)?;
                let ssid = required(kind, fields, "ssid")?;
                let encryption = required(kind, fields, "encryption")?;
                let password = optional(kind, fields, "password")?.ok_or(PayloadError::MissingField {
                    kind,
                    field: "password",
                })?;
                let hidden = match fields.get("hidden") {
                    None | Some(Value::Null) => false,
                    Some(Value::Bool(hidden)) => *hidden,
                    Some(_) => {
                        return Err(PayloadError::InvalidField {
                            kind,
                            field: "hidden",
                            expected: "a boolean",
                        });
                    }
                };
                Ok(QrPayload::Wifi(WifiPayload {
                    ssid,
                    encryption,
                    password,
                    hidden,
                }))
            }
            QrKind::Vcard => {
                let fields = object(kind, data)?;
                Ok(QrPayload::Vcard(VCardPayload {
                    first_name: required(kind, fields, "firstName")?,
                    last_name: required(kind, fields, "lastName")?,
                    organization: optional(kind, fields, "organization")?,
                    job_title: optional(kind, fields, "jobTitle")?,
                    phone: optional(kind, fields, "phone")?,
                    email: optional(kind, fields, "email")?,
                    website: optional(kind, fields, "website")?,
                    address: optional(kind, fields, "address")?,
                }))
            }
        }
    }

    pub fn kind(&self) -> QrKind {
        match self {
            QrPayload::Text(_) => QrKind::Text,
            QrPayload::Url(_) => QrKind::Url,
            QrPayload::Email(_) => QrKind::Email,
            QrPayload::Phone(_) => QrKind::Phone,
            QrPayload::Wifi(_) => QrKind::Wifi,
            QrPayload::Vcard(_) => QrKind::Vcard,
        }
    }

    /// The payload as submitted, for storage and API responses.
    pub fn to_value(&self) -> Value {
        // Serializing plain strings and flat string/bool structs cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The string a QR reader should decode from the rendered image.
    pub fn to_encodable_string(&self) -> String {
        match self {
            QrPayload::Text(text) | QrPayload::Url(text) => text.clone(),
            QrPayload::Email(email) => {
                let mut query = url::form_urlencoded::Serializer::new(String::new());
                if let Some(subject) = non_empty(&email.subject) {
                    query.append_pair("subject", subject);
                }
                if let Some(body) = non_empty(&email.body) {
                    query.append_pair("body", body);
                }
                let query = query.finish();
                if query.is_empty() {
                    format!("mailto:{}", email.email)
                } else {
                    format!("mailto:{}?{}", email.email, query)
                }
            }
            QrPayload::Phone(phone) => {
                let digits: String = phone.phone.chars().filter(|c| !c.is_whitespace()).collect();
                format!("tel:{digits}")
            }
            QrPayload::Wifi(wifi) => format!(
                "WIFI:S:{};T:{};P:{};H:{};;",
                wifi.ssid, wifi.encryption, wifi.password, wifi.hidden
            ),
            QrPayload::Vcard(card) => {
                let mut lines = vec![
                    "BEGIN:VCARD".to_string(),
                    "VERSION:3.0".to_string(),
                    format!("FN:{} {}", card.first_name, card.last_name),
                ];
                let optional_lines = [
                    ("ORG:", &card.organization),
                    ("TITLE:", &card.job_title),
                    ("TEL:", &card.phone),
                    ("EMAIL:", &card.email),
                    ("URL:", &card.website),
                    ("ADR:;;", &card.address),
                ];
                for (prefix, value) in optional_lines {
                    if let Some(value) = non_empty(value) {
                        lines.push(format!("{prefix}{value}"));
                    }
                }
                lines.push("END:VCARD".to_string());
                lines.join("\n")
            }
        }
    }
}

/// Format raw submitted data for a kind given by name.
///
/// Library entry point for callers that hold an untyped kind, e.g. records
/// imported from elsewhere. The HTTP service rejects unknown kinds up front and
/// formats through [`QrPayload`] directly.
///
/// Recognised kinds go through [`QrPayload`]. Anything else is stringified
/// as-is: strings unchanged, other JSON values as compact JSON text.
pub fn format_payload(kind: &str, data: &Value) -> Result<String, PayloadError> {
    match kind.parse::<QrKind>() {
        Ok(kind) => QrPayload::from_parts(kind, data).map(|payload| payload.to_encodable_string()),
        Err(_) => Ok(match data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

fn plain_string(kind: QrKind, data: &Value) -> Result<String, PayloadError> {
    match data {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(PayloadError::InvalidShape {
            kind,
            expected: "a string",
        }),
    }
}

fn object(kind: QrKind, data: &Value) -> Result<&Map<String, Value>, PayloadError> {
    data.as_object().ok_or(PayloadError::InvalidShape {
        kind,
        expected: "an object",
    })
}

fn optional(kind: QrKind, fields: &Map<String, Value>, field: &'static str) -> Result<Option<String>, PayloadError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(PayloadError::InvalidField {
            kind,
            field,
            expected: "a string",
        }),
    }
}

fn required(kind: QrKind, fields: &Map<String, Value>, field: &'static str) -> Result<String, PayloadError> {
    optional(kind, fields, field)?
        .filter(|value| !value.trim().is_empty())
        .ok_or(PayloadError::MissingField { kind, field })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
