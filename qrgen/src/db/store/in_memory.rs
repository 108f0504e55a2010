//! In-memory record store.
//!
//! Stores records in a `HashMap` behind a `parking_lot::RwLock`. Suitable for
//! tests and single-process runs; records are lost on restart.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::errors::Result;
use crate::db::models::qr_codes::{QrCodeCreateDBRequest, QrCodeDBResponse, QrCodeFilter, SortField, SortOrder};
use crate::db::store::RecordStore;
use crate::types::QrCodeId;

#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<QrCodeId, QrCodeDBResponse>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn compare(a: &QrCodeDBResponse, b: &QrCodeDBResponse, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Kind => a.kind().as_str().cmp(b.kind().as_str()),
        SortField::Size => a.size.cmp(&b.size),
        SortField::Margin => a.margin.cmp(&b.margin),
        SortField::ColorDark => a.color_dark.cmp(&b.color_dark),
        SortField::ColorLight => a.color_light.cmp(&b.color_light),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, request: &QrCodeCreateDBRequest) -> Result<QrCodeDBResponse> {
        let record = QrCodeDBResponse {
            id: Uuid::new_v4(),
            payload: request.payload.clone(),
            size: request.size,
            margin: request.margin,
            color_dark: request.color_dark.clone(),
            color_light: request.color_light.clone(),
            image: request.image.clone(),
            created_at: Utc::now(),
        };
        self.records.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: QrCodeId) -> Result<Option<QrCodeDBResponse>> {
        Ok(self.records.read().get(&id).cloned())
    }

    async fn delete_one(&self, id: QrCodeId) -> Result<u64> {
        Ok(u64::from(self.records.write().remove(&id).is_some()))
    }

    async fn find(&self, filter: &QrCodeFilter) -> Result<Vec<QrCodeDBResponse>> {
        let mut matching: Vec<QrCodeDBResponse> = self
            .records
            .read()
            .values()
            .filter(|r| filter.kind.is_none_or(|kind| r.kind() == kind))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let primary = match filter.sort_order {
                SortOrder::Asc => compare(a, b, filter.sort_by),
                SortOrder::Desc => compare(b, a, filter.sort_by),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let skip = usize::try_from(filter.skip).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: &QrCodeFilter) -> Result<i64> {
        let records = self.records.read();
        let count = records.values().filter(|r| filter.kind.is_none_or(|kind| r.kind() == kind)).count();
        Ok(count as i64)
    }
}
