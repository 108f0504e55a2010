//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, builds and binds its
//! queries, and returns domain models from [`crate::db::models`].
//!
//! ```ignore
//! use qrgen::db::handlers::{QrCodes, Repository};
//!
//! async fn example(pool: &sqlx::PgPool, id: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = QrCodes::new(&mut conn);
//!     let record = repo.get_by_id(id).await?;
//!     Ok(())
//! }
//! ```

pub mod qr_codes;
pub mod repository;

pub use qr_codes::QrCodes;
pub use repository::Repository;
