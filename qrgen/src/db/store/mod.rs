//! Store collaborator used by the record service.
//!
//! [`RecordStore`] is the seam between the service and persistence. Two
//! implementations are provided:
//!
//! - [`postgres::PgRecordStore`]: backed by the `qr_codes` table through the
//!   [`QrCodes`](crate::db::handlers::QrCodes) repository
//! - [`in_memory::InMemoryRecordStore`]: process-local, for tests and
//!   ephemeral runs; records are lost on restart

use async_trait::async_trait;

use crate::db::errors::Result;
use crate::db::models::qr_codes::{QrCodeCreateDBRequest, QrCodeDBResponse, QrCodeFilter};
use crate::types::QrCodeId;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record. The store assigns `id` and `created_at`.
    async fn insert(&self, request: &QrCodeCreateDBRequest) -> Result<QrCodeDBResponse>;

    async fn find_by_id(&self, id: QrCodeId) -> Result<Option<QrCodeDBResponse>>;

    /// Remove a record, returning how many were removed (0 or 1).
    async fn delete_one(&self, id: QrCodeId) -> Result<u64>;

    /// Records matching the filter, sorted and paged as it describes.
    ///
    /// Ties on the sort field are broken by ascending id.
    async fn find(&self, filter: &QrCodeFilter) -> Result<Vec<QrCodeDBResponse>>;

    /// Number of records matching the filter's kind, ignoring paging.
    async fn count(&self, filter: &QrCodeFilter) -> Result<i64>;
}
