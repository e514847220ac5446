use axum::{
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};

use crate::AppState;
use crate::error::{AppError, Result};
use crate::models::{Principal, UploadedImage};

/// Upload raw image bytes
///
/// The body is the image itself; `Content-Type` must be `image/*`.
pub async fn upload_image(
    State(state): State<AppState>,
    principal: Principal,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, axum::Json<UploadedImage>)> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("Image upload over the body limit from user {}", principal.user_id);
            AppError::PayloadTooLarge
        } else {
            AppError::ValidationFailed(rejection.body_text())
        }
    })?;

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let uploaded = state
        .blobs
        .upload(&principal, content_type, body.to_vec())
        .await?;

    Ok((StatusCode::CREATED, axum::Json(uploaded)))
}

/// Serve a stored image with its original content type
pub async fn get_image(
    State(state): State<AppState>,
    Path(storage_id): Path<String>,
) -> Result<impl IntoResponse> {
    let blob = state.blobs.get(&storage_id).await?;

    Ok(([(CONTENT_TYPE, blob.content_type)], blob.data))
}
