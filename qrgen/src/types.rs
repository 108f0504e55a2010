//! Common type definitions.
//!
//! - [`QrCodeId`]: identifier assigned to a stored QR code record
//! - [`abbrev_uuid`]: abbreviate UUIDs to their first 8 chars for logging

use uuid::Uuid;

pub type QrCodeId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Parse a path segment as a record id.
///
/// Anything that is not a UUID can never name a stored record, so callers
/// treat `None` as "not found".
pub fn parse_id(raw: &str) -> Option<QrCodeId> {
    Uuid::parse_str(raw.trim()).ok()
}
