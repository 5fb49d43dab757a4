//! Image submission and status handlers.

use super::{SubmitImageRequest, SubmitImageResponse};
use crate::api::AppState;
use crate::types::ImageId;
use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

/// POST /images - Submit an image URL for retrieval
#[utoipa::path(
    post,
    path = "/images",
    tag = "images",
    request_body = SubmitImageRequest,
    responses(
        (status = 200, description = "Record created, retrieval scheduled", body = SubmitImageResponse),
        (status = 400, description = "Invalid URL", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_image(
    State(state): State<AppState>,
    Json(request): Json<SubmitImageRequest>,
) -> Response {
    match state.fetcher.submit(&request.url).await {
        Ok(receipt) => Json(SubmitImageResponse {
            stored_url: receipt.poll_url,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /images/:id - Get the status of a single record
#[utoipa::path(
    get,
    path = "/images/{id}",
    tag = "images",
    params(
        ("id" = i64, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Status projection", body = crate::projection::StatusProjection),
        (status = 404, description = "Unknown record ID", body = crate::error::ApiError)
    )
)]
pub async fn get_image(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.fetcher.get_status(ImageId(id)).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /images - List all records with their status
#[utoipa::path(
    get,
    path = "/images",
    tag = "images",
    responses(
        (status = 200, description = "All records, oldest first", body = Vec<crate::projection::ListingEntry>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn list_images(State(state): State<AppState>) -> Response {
    match state.fetcher.list_statuses().await {
        Ok(listing) => Json(listing).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list images");
            e.into_response()
        }
    }
}
