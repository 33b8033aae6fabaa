//! File access coordination.
//!
//! Every operation is scoped to the calling user. A file that exists but
//! belongs to someone else is indistinguishable from one that does not
//! exist: both come back as NotFound.

use filevault_core::constants::METADATA_DELETE_RETRIES;
use filevault_core::models::{
    extension_of, FileKind, FileRecord, FileRecordResponse, ListOptions, NewFileRecord,
};
use filevault_core::{AppError, Config};
use filevault_db::FileIndex;
use filevault_storage::{object_key, Storage, UrlPurpose};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Signed download link, attachment disposition, short-lived.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub download_url: String,
    pub filename: String,
}

/// Signed preview link, inline disposition, longer-lived than a download.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLink {
    pub preview_url: String,
    pub filename: String,
    #[serde(rename = "fileType")]
    pub kind: FileKind,
    pub mime_type: String,
}

/// Coordinates the metadata index and the object store so they stay
/// consistent across uploads and deletes.
#[derive(Clone)]
pub struct FileAccessService {
    index: Arc<dyn FileIndex>,
    storage: Arc<dyn Storage>,
    max_file_size_bytes: usize,
    download_ttl: Duration,
    preview_ttl: Duration,
}

impl FileAccessService {
    pub fn new(index: Arc<dyn FileIndex>, storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::with_limits(
            index,
            storage,
            config.max_file_size_bytes(),
            Duration::from_secs(config.download_url_ttl_secs()),
            Duration::from_secs(config.preview_url_ttl_secs()),
        )
    }

    pub fn with_limits(
        index: Arc<dyn FileIndex>,
        storage: Arc<dyn Storage>,
        max_file_size_bytes: usize,
        download_ttl: Duration,
        preview_ttl: Duration,
    ) -> Self {
        Self {
            index,
            storage,
            max_file_size_bytes,
            download_ttl,
            preview_ttl,
        }
    }

    /// Store a file: object first, metadata second. If the metadata insert
    /// fails the object is deleted again so no orphan is left behind.
    pub async fn upload(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<FileRecordResponse, AppError> {
        if filename.is_empty() {
            return Err(AppError::InvalidInput("Filename is required".to_string()));
        }
        // Size check happens before anything is written anywhere.
        if data.len() > self.max_file_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} bytes exceeds the maximum of {} bytes",
                data.len(),
                self.max_file_size_bytes
            )));
        }

        let size = data.len() as i64;
        let kind = FileKind::from_filename(filename);
        let file_id = Uuid::new_v4();
        let storage_key = object_key(user_id, file_id, extension_of(filename));

        self.storage.put(&storage_key, content_type, data).await?;

        let record = NewFileRecord {
            file_id,
            user_id,
            filename: filename.to_string(),
            size,
            kind,
            content_type: content_type.to_string(),
            storage_key: storage_key.clone(),
            uploaded_at: chrono::Utc::now(),
        };

        let stored = match self.index.put(record).await {
            Ok(stored) => stored,
            Err(index_err) => {
                // Compensating delete: the object went in but its metadata
                // did not. Remove the object so the failure leaves nothing
                // behind.
                if let Err(cleanup_err) = self.storage.delete(&storage_key).await {
                    tracing::error!(
                        key = %storage_key,
                        error = %cleanup_err,
                        "Orphaned object left in storage after metadata insert failure"
                    );
                }
                return Err(index_err);
            }
        };

        tracing::info!(
            user_id = %user_id,
            file_id = %stored.file_id,
            size_bytes = size,
            kind = kind.as_str(),
            "File uploaded"
        );
        Ok(stored.into())
    }

    /// List the user's files with optional kind filter and sorting.
    pub async fn list(
        &self,
        user_id: Uuid,
        options: ListOptions,
    ) -> Result<Vec<FileRecordResponse>, AppError> {
        let records = self.index.query(user_id, options).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Case-sensitive substring search over the user's filenames.
    pub async fn search(
        &self,
        user_id: Uuid,
        keyword: &str,
    ) -> Result<Vec<FileRecordResponse>, AppError> {
        if keyword.trim().is_empty() {
            return Err(AppError::EmptyKeyword);
        }
        let records = self.index.search(user_id, keyword).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Fetch one file's metadata.
    pub async fn detail(
        &self,
        user_id: Uuid,
        file_id: Uuid,
    ) -> Result<FileRecordResponse, AppError> {
        Ok(self.owned_record(user_id, file_id).await?.into())
    }

    /// Signed attachment URL, valid for the download TTL.
    pub async fn download_url(
        &self,
        user_id: Uuid,
        file_id: Uuid,
    ) -> Result<DownloadLink, AppError> {
        let record = self.available_record(user_id, file_id).await?;
        let download_url = self
            .storage
            .presigned_get_url(
                &record.storage_key,
                UrlPurpose::Download,
                &record.filename,
                self.download_ttl,
            )
            .await?;

        Ok(DownloadLink {
            download_url,
            filename: record.filename,
        })
    }

    /// Signed inline URL, valid for the preview TTL.
    pub async fn preview_url(&self, user_id: Uuid, file_id: Uuid) -> Result<PreviewLink, AppError> {
        let record = self.available_record(user_id, file_id).await?;
        let preview_url = self
            .storage
            .presigned_get_url(
                &record.storage_key,
                UrlPurpose::Inline,
                &record.filename,
                self.preview_ttl,
            )
            .await?;

        Ok(PreviewLink {
            preview_url,
            filename: record.filename,
            kind: record.kind,
            mime_type: record.content_type,
        })
    }

    /// Delete a file: object first, metadata second.
    ///
    /// A storage failure aborts with the metadata intact, so the file stays
    /// visible and the delete can be retried. Once the object is gone the
    /// metadata delete is retried a few times; if it still fails the caller
    /// gets PartialDelete and the row stays behind as a dangling entry.
    pub async fn delete(&self, user_id: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let record = self.owned_record(user_id, file_id).await?;

        self.storage.delete(&record.storage_key).await?;

        let mut last_err = None;
        for attempt in 1..=METADATA_DELETE_RETRIES {
            match self.index.delete(user_id, file_id).await {
                Ok(_) => {
                    tracing::info!(user_id = %user_id, file_id = %file_id, "File deleted");
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        file_id = %file_id,
                        error = %err,
                        "Metadata delete failed"
                    );
                    last_err = Some(err);
                }
            }
        }

        tracing::error!(
            user_id = %user_id,
            file_id = %file_id,
            error = ?last_err,
            "Object removed but its metadata row could not be deleted"
        );
        Err(AppError::PartialDelete { file_id })
    }

    async fn owned_record(&self, user_id: Uuid, file_id: Uuid) -> Result<FileRecord, AppError> {
        self.index
            .get(user_id, file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// A record whose object is actually present in storage. A dangling row
    /// (metadata without object, e.g. after a PartialDelete) still lists,
    /// but cannot be downloaded or previewed.
    async fn available_record(&self, user_id: Uuid, file_id: Uuid) -> Result<FileRecord, AppError> {
        let record = self.owned_record(user_id, file_id).await?;
        if !self.storage.exists(&record.storage_key).await? {
            tracing::warn!(
                file_id = %file_id,
                key = %record.storage_key,
                "Metadata row has no backing object"
            );
            return Err(AppError::NotFound("File is unavailable".to_string()));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filevault_db::InMemoryFileIndex;
    use filevault_storage::LocalStorage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    const MAX_BYTES: usize = 5 * 1024 * 1024;

    async fn local_storage() -> (TempDir, Arc<dyn Storage>) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_string_lossy().to_string(),
            "http://localhost:4000/objects".to_string(),
            b"service test signing secret".to_vec(),
        )
        .await
        .unwrap();
        (dir, Arc::new(storage))
    }

    fn service(index: Arc<dyn FileIndex>, storage: Arc<dyn Storage>) -> FileAccessService {
        FileAccessService::with_limits(
            index,
            storage,
            MAX_BYTES,
            Duration::from_secs(60),
            Duration::from_secs(300),
        )
    }

    /// Index whose inserts always fail, for exercising the compensating
    /// delete path.
    struct RejectingIndex;

    #[async_trait]
    impl FileIndex for RejectingIndex {
        async fn put(&self, _record: NewFileRecord) -> Result<FileRecord, AppError> {
            Err(AppError::Internal("insert failed".to_string()))
        }

        async fn get(&self, _user_id: Uuid, _file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
            Ok(None)
        }

        async fn query(
            &self,
            _user_id: Uuid,
            _options: ListOptions,
        ) -> Result<Vec<FileRecord>, AppError> {
            Ok(Vec::new())
        }

        async fn search(&self, _user_id: Uuid, _keyword: &str) -> Result<Vec<FileRecord>, AppError> {
            Ok(Vec::new())
        }

        async fn delete(&self, _user_id: Uuid, _file_id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    /// Delegates to an in-memory index but fails the first N metadata
    /// deletes.
    struct FlakyDeleteIndex {
        inner: InMemoryFileIndex,
        failures_left: AtomicU32,
    }

    impl FlakyDeleteIndex {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemoryFileIndex::new(),
                failures_left: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl FileIndex for FlakyDeleteIndex {
        async fn put(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
            self.inner.put(record).await
        }

        async fn get(&self, user_id: Uuid, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
            self.inner.get(user_id, file_id).await
        }

        async fn query(
            &self,
            user_id: Uuid,
            options: ListOptions,
        ) -> Result<Vec<FileRecord>, AppError> {
            self.inner.query(user_id, options).await
        }

        async fn search(&self, user_id: Uuid, keyword: &str) -> Result<Vec<FileRecord>, AppError> {
            self.inner.search(user_id, keyword).await
        }

        async fn delete(&self, user_id: Uuid, file_id: Uuid) -> Result<bool, AppError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::Internal("delete failed".to_string()));
            }
            self.inner.delete(user_id, file_id).await
        }
    }

    #[tokio::test]
    async fn test_upload_and_detail() {
        let (_dir, storage) = local_storage().await;
        let service = service(Arc::new(InMemoryFileIndex::new()), storage);
        let user = Uuid::new_v4();

        let uploaded = service
            .upload(user, "photo.png", "image/png", b"pixels".to_vec())
            .await
            .unwrap();
        assert_eq!(uploaded.filename, "photo.png");
        assert_eq!(uploaded.kind, FileKind::Image);
        assert_eq!(uploaded.size, 6);

        let detail = service.detail(user, uploaded.file_id).await.unwrap();
        assert_eq!(detail.file_id, uploaded.file_id);
    }

    #[tokio::test]
    async fn test_upload_rejects_oversize_before_writing() {
        let (dir, storage) = local_storage().await;
        let index = Arc::new(InMemoryFileIndex::new());
        let service = service(index.clone(), storage);

        let result = service
            .upload(
                Uuid::new_v4(),
                "big.bin",
                "application/octet-stream",
                vec![0u8; MAX_BYTES + 1],
            )
            .await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));

        assert!(index.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_compensates_on_metadata_failure() {
        let (dir, storage) = local_storage().await;
        let service = service(Arc::new(RejectingIndex), storage);
        let user = Uuid::new_v4();

        let result = service
            .upload(user, "a.txt", "text/plain", b"data".to_vec())
            .await;
        assert!(result.is_err());

        // The compensating delete removed the object again.
        let user_dir = dir.path().join(user.to_string());
        let leftover = std::fs::read_dir(&user_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_keyword() {
        let (_dir, storage) = local_storage().await;
        let service = service(Arc::new(InMemoryFileIndex::new()), storage);

        for keyword in ["", "   ", "\t"] {
            let result = service.search(Uuid::new_v4(), keyword).await;
            assert!(matches!(result, Err(AppError::EmptyKeyword)), "{:?}", keyword);
        }
    }

    #[tokio::test]
    async fn test_download_and_preview_urls() {
        let (_dir, storage) = local_storage().await;
        let service = service(Arc::new(InMemoryFileIndex::new()), storage);
        let user = Uuid::new_v4();

        let uploaded = service
            .upload(user, "report.pdf", "application/pdf", b"%PDF".to_vec())
            .await
            .unwrap();

        let link = service.download_url(user, uploaded.file_id).await.unwrap();
        assert_eq!(link.filename, "report.pdf");
        assert!(link.download_url.contains(&user.to_string()));

        let preview = service.preview_url(user, uploaded.file_id).await.unwrap();
        assert_eq!(preview.kind, FileKind::Document);
        assert_eq!(preview.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_other_users_files_are_not_found() {
        let (_dir, storage) = local_storage().await;
        let service = service(Arc::new(InMemoryFileIndex::new()), storage);
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let uploaded = service
            .upload(owner, "secret.txt", "text/plain", b"x".to_vec())
            .await
            .unwrap();

        for result in [
            service.detail(stranger, uploaded.file_id).await.err(),
            service
                .download_url(stranger, uploaded.file_id)
                .await
                .err(),
            service.delete(stranger, uploaded.file_id).await.err(),
        ] {
            assert!(matches!(result, Some(AppError::NotFound(_))));
        }

        // The owner still sees the file.
        assert!(service.detail(owner, uploaded.file_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_object_and_metadata() {
        let (_dir, storage) = local_storage().await;
        let index = Arc::new(InMemoryFileIndex::new());
        let service = service(index.clone(), storage.clone());
        let user = Uuid::new_v4();

        let uploaded = service
            .upload(user, "a.txt", "text/plain", b"x".to_vec())
            .await
            .unwrap();
        service.delete(user, uploaded.file_id).await.unwrap();

        assert!(index.is_empty());
        let key = object_key(user, uploaded.file_id, ".txt");
        assert!(!storage.exists(&key).await.unwrap());

        // Deleting again is a NotFound, not an error about storage.
        let result = service.delete(user, uploaded.file_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_retries_metadata_then_succeeds() {
        let (_dir, storage) = local_storage().await;
        let index = Arc::new(FlakyDeleteIndex::new(2));
        let service = service(index, storage);
        let user = Uuid::new_v4();

        let uploaded = service
            .upload(user, "a.txt", "text/plain", b"x".to_vec())
            .await
            .unwrap();
        // Two failures, third attempt lands within the retry budget.
        service.delete(user, uploaded.file_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_reports_partial_after_exhausted_retries() {
        let (_dir, storage) = local_storage().await;
        let index = Arc::new(FlakyDeleteIndex::new(u32::MAX));
        let service = service(index.clone(), storage.clone());
        let user = Uuid::new_v4();

        let uploaded = service
            .upload(user, "a.txt", "text/plain", b"x".to_vec())
            .await
            .unwrap();
        let result = service.delete(user, uploaded.file_id).await;
        assert!(matches!(result, Err(AppError::PartialDelete { .. })));

        // The dangling row still lists but can no longer be downloaded.
        let listed = service.list(user, ListOptions::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        let result = service.download_url(user, uploaded.file_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
