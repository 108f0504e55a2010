//! Data persistence.
//!
//! ```text
//! ┌──────────────┐
//! │ QrCodeService│  (qr::service)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │ RecordStore  │  (db::store - PostgreSQL or in-memory)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - queries over a PgConnection)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │  PostgreSQL  │
//! └──────────────┘
//! ```
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
