//! Page-based pagination parameters for list endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters selecting one page of results.
///
/// Values arrive as strings and are parsed here, so a non-numeric `page` or
/// `limit` is rejected before reaching the service. Range checks (both must be
/// at least 1, `limit` is clamped to the configured maximum) happen in
/// [`QrCodeService::list`](crate::qr::service::QrCodeService::list).
#[serde_as]
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items per page (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

/// Number of pages needed to show `total` items, `limit` per page.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Paginated list of items, in the shape the client expects.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedQrCodes<T: ToSchema> {
    /// The items for the current page
    pub qr_codes: Vec<T>,
    /// `ceil(total / limit)`
    pub total_pages: i64,
    pub current_page: i64,
    /// Total number of items matching the query (before pagination)
    pub total: i64,
}
