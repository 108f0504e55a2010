use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        ApiResponse, ErrorResponse, MessageResponse,
        pagination::PaginatedQrCodes,
        qr_codes::{ListQrCodesQuery, QrCodeCreate, QrCodeResponse},
    },
    errors::Result,
};

#[utoipa::path(
    post,
    path = "/qr/generate",
    tag = "qr",
    summary = "Generate QR code",
    description = "Format the payload for its kind, render it as a PNG and store the result.",
    request_body = QrCodeCreate,
    responses(
        (status = 201, description = "QR code generated", body = ApiResponse<QrCodeResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Encoder or store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn generate_qr_code(
    State(state): State<AppState>,
    body: std::result::Result<Json<QrCodeCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<QrCodeResponse>>)> {
    let Json(create) = body?;
    let record = state.service.create(&create).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("QR code generated successfully", record.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/qr",
    tag = "qr",
    summary = "List QR codes",
    params(ListQrCodesQuery),
    responses(
        (status = 200, description = "One page of QR codes", body = ApiResponse<PaginatedQrCodes<QrCodeResponse>>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_qr_codes(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListQrCodesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedQrCodes<QrCodeResponse>>>> {
    let Query(query) = query?;
    let page = state.service.list(&query).await?;

    Ok(Json(ApiResponse::ok(PaginatedQrCodes {
        qr_codes: page.records.into_iter().map(QrCodeResponse::from).collect(),
        total_pages: page.total_pages,
        current_page: page.current_page,
        total: page.total_count,
    })))
}

#[utoipa::path(
    get,
    path = "/qr/{id}",
    tag = "qr",
    summary = "Get QR code",
    params(("id" = String, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "The QR code", body = ApiResponse<QrCodeResponse>),
        (status = 404, description = "QR code not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_qr_code(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ApiResponse<QrCodeResponse>>> {
    let record = state.service.get_by_id(&id).await?;
    Ok(Json(ApiResponse::ok(record.into())))
}

#[utoipa::path(
    delete,
    path = "/qr/{id}",
    tag = "qr",
    summary = "Delete QR code",
    params(("id" = String, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "QR code deleted", body = MessageResponse),
        (status = 404, description = "QR code not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_qr_code(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<MessageResponse>> {
    state.service.delete(&id).await?;
    Ok(Json(MessageResponse::new("QR code deleted successfully")))
}
