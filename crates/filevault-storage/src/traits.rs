//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Signed URL has expired")]
    UrlExpired,

    #[error("Signed URL rejected: {0}")]
    UrlRejected(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for filevault_core::AppError {
    fn from(err: StorageError) -> Self {
        use filevault_core::AppError;
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::IoError(io_err) => AppError::Internal(format!("IO error: {}", io_err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            StorageError::UrlExpired => {
                AppError::InvalidInput("This link has expired".to_string())
            }
            StorageError::UrlRejected(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// What a signed URL is for. Drives the Content-Disposition of the response
/// the object store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlPurpose {
    /// Force the browser to save the file (attachment disposition).
    Download,
    /// Allow the browser to render the file inline (preview).
    Inline,
}

impl UrlPurpose {
    /// Content-Disposition header value for this purpose. The filename is
    /// percent-encoded so quotes and non-ASCII characters cannot break the
    /// header.
    pub fn content_disposition(&self, filename: &str) -> String {
        let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC);
        match self {
            UrlPurpose::Download => format!("attachment; filename*=UTF-8''{}", encoded),
            UrlPurpose::Inline => format!("inline; filename*=UTF-8''{}", encoded),
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// This allows the file service to work with any backend without coupling
/// to implementation details.
///
/// **Key format:** `{user_id}/{file_id}{extension}`. See the crate root
/// documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload data to a storage key.
    async fn put(&self, storage_key: &str, content_type: &str, data: Vec<u8>)
        -> StorageResult<()>;

    /// Download an object by its storage key.
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by its storage key.
    ///
    /// Deleting an absent object is not an error; delete is idempotent on
    /// every backend.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Generate a time-limited signed URL for direct GET access.
    ///
    /// `purpose` selects the Content-Disposition served with the object and
    /// `filename` is the name presented to the browser, which need not match
    /// the storage key.
    async fn presigned_get_url(
        &self,
        storage_key: &str,
        purpose: UrlPurpose,
        filename: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Check if an object exists.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
