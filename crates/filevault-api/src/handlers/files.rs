//! File handlers: upload, list, search, detail, signed URLs, delete.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use filevault_core::models::{FileKind, FileRecordResponse, ListOptions, SortField, SortOrder};
use filevault_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::Identity;
use crate::constants::UPLOAD_FIELD;
use crate::error::HttpAppError;
use crate::services::{DownloadLink, PreviewLink};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Filter by file kind: image, video, document, or other.
    pub file_type: Option<String>,
    /// Sort column: filename, size, or uploaded_at (default).
    pub sort_by: Option<String>,
    /// Sort direction: asc or desc (default).
    pub order: Option<String>,
}

impl ListParams {
    fn into_options(self) -> Result<ListOptions, AppError> {
        let kind = self
            .file_type
            .map(|s| s.parse::<FileKind>())
            .transpose()
            .map_err(|err| AppError::InvalidInput(err.to_string()))?;
        let sort_by = self
            .sort_by
            .map(|s| s.parse::<SortField>())
            .transpose()
            .map_err(|err| AppError::InvalidInput(err.to_string()))?
            .unwrap_or_default();
        let order = self
            .order
            .map(|s| s.parse::<SortOrder>())
            .transpose()
            .map_err(|err| AppError::InvalidInput(err.to_string()))?
            .unwrap_or_default();

        Ok(ListOptions {
            kind,
            sort_by,
            order,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    pub keyword: Option<String>,
}

/// Upload a file as the `file` field of a multipart form.
#[utoipa::path(
    post,
    path = "/files/upload",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = FileRecordResponse),
        (status = 400, description = "Missing or invalid multipart field", body = crate::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
        (status = 413, description = "File exceeds the size limit", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid multipart body: {}",
            err
        )))
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|err| {
                HttpAppError(AppError::InvalidInput(format!(
                    "Failed to read multipart field: {}",
                    err
                )))
            })?
            .to_vec();

        let stored = state
            .files
            .upload(identity.user_id, &filename, &content_type, data)
            .await?;
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(HttpAppError(AppError::InvalidInput(format!(
        "Missing multipart field '{}'",
        UPLOAD_FIELD
    ))))
}

/// List the caller's files.
#[utoipa::path(
    get,
    path = "/files/list",
    tag = "files",
    params(ListParams),
    responses(
        (status = 200, description = "Files for the authenticated user", body = [FileRecordResponse]),
        (status = 400, description = "Invalid filter or sort parameter", body = crate::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FileRecordResponse>>, HttpAppError> {
    let options = params.into_options()?;
    let files = state.files.list(identity.user_id, options).await?;
    Ok(Json(files))
}

/// Search the caller's files by filename substring (case-sensitive).
#[utoipa::path(
    get,
    path = "/files/search",
    tag = "files",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching files, newest first", body = [FileRecordResponse]),
        (status = 400, description = "Keyword is empty", body = crate::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_files(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FileRecordResponse>>, HttpAppError> {
    let keyword = params.keyword.unwrap_or_default();
    let files = state.files.search(identity.user_id, &keyword).await?;
    Ok(Json(files))
}

/// Fetch one file's metadata.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File metadata", body = FileRecordResponse),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
        (status = 404, description = "No such file for this user", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<FileRecordResponse>, HttpAppError> {
    let file = state.files.detail(identity.user_id, id).await?;
    Ok(Json(file))
}

/// Signed, short-lived download URL (attachment disposition).
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "Signed download URL", body = DownloadLink),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
        (status = 404, description = "No such file for this user", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<DownloadLink>, HttpAppError> {
    let link = state.files.download_url(identity.user_id, id).await?;
    Ok(Json(link))
}

/// Signed preview URL (inline disposition).
#[utoipa::path(
    get,
    path = "/files/{id}/preview",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "Signed preview URL", body = PreviewLink),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
        (status = 404, description = "No such file for this user", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn preview_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewLink>, HttpAppError> {
    let link = state.files.preview_url(identity.user_id, id).await?;
    Ok(Json(link))
}

/// Delete a file and its metadata.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
        (status = 404, description = "No such file for this user", body = crate::ErrorResponse),
        (status = 500, description = "Object removed but metadata remains", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    state.files.delete(identity.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
