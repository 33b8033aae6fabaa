//! Signed object serving for the local storage backend.
//!
//! S3 presigned URLs are validated by S3 itself; local signed URLs come back
//! here. The signature covers the key, the expiry, and the disposition, so a
//! link cannot be replayed after its TTL or coerced from attachment to
//! inline.

use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_DISPOSITION,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use filevault_core::AppError;
use filevault_storage::Storage;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SignedGetParams {
    /// Expiry as seconds since the Unix epoch.
    pub expires: u64,
    /// Content-Disposition to serve, covered by the signature.
    pub disposition: String,
    /// Base64url HMAC tag over key, expiry, and disposition.
    pub signature: String,
}

/// Serve one object through its signed URL.
#[utoipa::path(
    get,
    path = "/objects/{key}",
    tag = "files",
    params(
        ("key" = String, Path, description = "Storage key"),
        SignedGetParams,
    ),
    responses(
        (status = 200, description = "Object bytes with the signed disposition"),
        (status = 400, description = "Signature invalid or link expired", body = crate::ErrorResponse),
        (status = 404, description = "No such object", body = crate::ErrorResponse),
    )
)]
pub async fn serve_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(params): Query<SignedGetParams>,
) -> Result<Response, HttpAppError> {
    let local = state
        .local_objects
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    local.verify_signed_get(&key, params.expires, &params.disposition, &params.signature)?;

    let disposition = HeaderValue::from_str(&params.disposition)
        .map_err(|_| AppError::InvalidInput("Invalid disposition".to_string()))?;
    let data = local.download(&key).await?;

    let mut response = data.into_response();
    response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    Ok(response)
}
