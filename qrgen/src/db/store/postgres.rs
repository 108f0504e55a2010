//! PostgreSQL record store.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::errors::Result;
use crate::db::handlers::{QrCodes, Repository};
use crate::db::models::qr_codes::{QrCodeCreateDBRequest, QrCodeDBResponse, QrCodeFilter};
use crate::db::store::RecordStore;
use crate::types::QrCodeId;

/// Record store over a connection pool. Each call acquires its own connection;
/// every operation is a single statement so no explicit transaction is needed.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, request: &QrCodeCreateDBRequest) -> Result<QrCodeDBResponse> {
        let mut conn = self.pool.acquire().await?;
        QrCodes::new(&mut conn).create(request).await
    }

    async fn find_by_id(&self, id: QrCodeId) -> Result<Option<QrCodeDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        QrCodes::new(&mut conn).get_by_id(id).await
    }

    async fn delete_one(&self, id: QrCodeId) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let removed = QrCodes::new(&mut conn).delete(id).await?;
        Ok(u64::from(removed))
    }

    async fn find(&self, filter: &QrCodeFilter) -> Result<Vec<QrCodeDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        QrCodes::new(&mut conn).list(filter).await
    }

    async fn count(&self, filter: &QrCodeFilter) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        QrCodes::new(&mut conn).count(filter).await
    }
}
