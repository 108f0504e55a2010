//! Database repository for generated QR codes.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgConnection, QueryBuilder, types::Json};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::qr_codes::{QrCodeCreateDBRequest, QrCodeDBResponse, QrCodeFilter, SortField},
};
use crate::qr::payload::{QrKind, QrPayload};
use crate::types::{QrCodeId, abbrev_uuid};

const TABLE: &str = "qr_codes";

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct QrCodeRow {
    id: QrCodeId,
    kind: String,
    payload: Json<Value>,
    size: i32,
    margin: i32,
    color_dark: String,
    color_light: String,
    image: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<QrCodeRow> for QrCodeDBResponse {
    type Error = DbError;

    fn try_from(row: QrCodeRow) -> Result<Self> {
        let corrupt = |message: String| DbError::CorruptRow { table: TABLE, message };
        let kind: QrKind = row.kind.parse().map_err(|e: crate::qr::payload::PayloadError| corrupt(e.to_string()))?;
        let payload = QrPayload::from_parts(kind, &row.payload.0).map_err(|e| corrupt(format!("{}: {e}", abbrev_uuid(&row.id))))?;

        Ok(Self {
            id: row.id,
            payload,
            size: row.size,
            margin: row.margin,
            color_dark: row.color_dark,
            color_light: row.color_light,
            image: row.image,
            created_at: row.created_at,
        })
    }
}

pub struct QrCodes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> QrCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count records matching the filter's kind; paging and sort are ignored.
    #[instrument(skip(self, filter), fields(kind = ?filter.kind), err)]
    pub async fn count(&mut self, filter: &QrCodeFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM qr_codes WHERE 1=1");

        if let Some(kind) = filter.kind {
            query.push(" AND kind = ");
            query.push_bind(kind.as_str());
        }

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for QrCodes<'c> {
    type CreateRequest = QrCodeCreateDBRequest;
    type Response = QrCodeDBResponse;
    type Id = QrCodeId;
    type Filter = QrCodeFilter;

    #[instrument(skip(self, request), fields(kind = %request.payload.kind(), size = request.size), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, QrCodeRow>(
            r#"
            INSERT INTO qr_codes (kind, payload, size, margin, color_dark, color_light, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.payload.kind().as_str())
        .bind(Json(request.payload.to_value()))
        .bind(request.size)
        .bind(request.margin)
        .bind(&request.color_dark)
        .bind(&request.color_light)
        .bind(&request.image)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), fields(qr_code_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, QrCodeRow>("SELECT * FROM qr_codes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(QrCodeDBResponse::try_from).transpose()
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM qr_codes WHERE 1=1");

        if let Some(kind) = filter.kind {
            query.push(" AND kind = ");
            query.push_bind(kind.as_str());
        }

        // Column and direction come from closed enums, never from user text.
        query.push(" ORDER BY ");
        query.push(filter.sort_by.column());
        query.push(" ");
        query.push(filter.sort_order.as_sql());
        if filter.sort_by != SortField::Id {
            query.push(", id ASC");
        }

        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let rows = query.build_query_as::<QrCodeRow>().fetch_all(&mut *self.db).await?;

        rows.into_iter().map(QrCodeDBResponse::try_from).collect()
    }

    #[instrument(skip(self), fields(qr_code_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM qr_codes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
