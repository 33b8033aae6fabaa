//! In-memory repository implementations for testing
//!
//! These mirror the Postgres repositories' semantics (user scoping, sort
//! tie-breaking, case-sensitive search) without a database.

use async_trait::async_trait;
use chrono::Utc;
use filevault_core::models::{FileRecord, ListOptions, NewFileRecord, SortField, SortOrder, User};
use filevault_core::AppError;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{self, AtomicI64};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::index::FileIndex;
use crate::users::UserStore;

/// In-memory file index for testing without a database
#[derive(Clone, Default)]
pub struct InMemoryFileIndex {
    records: Arc<Mutex<HashMap<(Uuid, Uuid), FileRecord>>>,
    next_seq: Arc<AtomicI64>,
}

impl InMemoryFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compare_field(a: &FileRecord, b: &FileRecord, field: SortField) -> Ordering {
    match field {
        SortField::Filename => a.filename.cmp(&b.filename),
        SortField::Size => a.size.cmp(&b.size),
        SortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
    }
}

fn sort_records(records: &mut [FileRecord], sort_by: SortField, order: SortOrder) {
    // Field comparison first, then seq ascending so equal keys keep
    // insertion order in both directions.
    records.sort_by(|a, b| {
        let by_field = match order {
            SortOrder::Asc => compare_field(a, b, sort_by),
            SortOrder::Desc => compare_field(b, a, sort_by),
        };
        by_field.then(a.seq.cmp(&b.seq))
    });
}

#[async_trait]
impl FileIndex for InMemoryFileIndex {
    async fn put(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let mut records = self.records.lock().unwrap();
        let key = (record.user_id, record.file_id);
        if records.contains_key(&key) {
            return Err(AppError::DuplicateKey(format!(
                "File {} already exists",
                record.file_id
            )));
        }

        let stored = FileRecord {
            file_id: record.file_id,
            user_id: record.user_id,
            filename: record.filename,
            size: record.size,
            kind: record.kind,
            content_type: record.content_type,
            storage_key: record.storage_key,
            uploaded_at: record.uploaded_at,
            seq: self.next_seq.fetch_add(1, atomic::Ordering::SeqCst),
        };
        records.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get(&self, user_id: Uuid, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(user_id, file_id))
            .cloned())
    }

    async fn query(
        &self,
        user_id: Uuid,
        options: ListOptions,
    ) -> Result<Vec<FileRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut matched: Vec<FileRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| options.kind.map(|k| r.kind == k).unwrap_or(true))
            .cloned()
            .collect();
        drop(records);

        sort_records(&mut matched, options.sort_by, options.order);
        Ok(matched)
    }

    async fn search(&self, user_id: Uuid, keyword: &str) -> Result<Vec<FileRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let mut matched: Vec<FileRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| r.filename.contains(keyword))
            .cloned()
            .collect();
        drop(records);

        sort_records(&mut matched, SortField::UploadedAt, SortOrder::Desc);
        Ok(matched)
    }

    async fn delete(&self, user_id: Uuid, file_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .remove(&(user_id, file_id))
            .is_some())
    }
}

/// In-memory user store for testing without a database
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == email) {
            return Err(AppError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_confirmed: false,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn confirm(&self, email: &str) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        match users.values_mut().find(|u| u.email == email) {
            Some(user) => {
                user.is_confirmed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn record_login(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use filevault_core::models::FileKind;

    fn record(user_id: Uuid, filename: &str, size: i64, uploaded_at: DateTime<Utc>) -> NewFileRecord {
        NewFileRecord {
            file_id: Uuid::new_v4(),
            user_id,
            filename: filename.to_string(),
            size,
            kind: FileKind::from_filename(filename),
            content_type: "application/octet-stream".to_string(),
            storage_key: format!("{}/{}", user_id, filename),
            uploaded_at,
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[tokio::test]
    async fn test_put_assigns_increasing_seq() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        let a = index.put(record(user, "a.txt", 1, ts(0))).await.unwrap();
        let b = index.put(record(user, "b.txt", 1, ts(0))).await.unwrap();
        assert!(b.seq > a.seq);
    }

    #[tokio::test]
    async fn test_put_rejects_duplicate() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        let mut rec = record(user, "a.txt", 1, ts(0));
        rec.file_id = Uuid::new_v4();
        index.put(rec.clone()).await.unwrap();

        let result = index.put(rec).await;
        assert!(matches!(result, Err(AppError::DuplicateKey(_))));
    }

    #[tokio::test]
    async fn test_query_scoped_to_user() {
        let index = InMemoryFileIndex::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        index.put(record(alice, "a.txt", 1, ts(0))).await.unwrap();
        index.put(record(bob, "b.txt", 1, ts(0))).await.unwrap();

        let listed = index.query(alice, ListOptions::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "a.txt");
    }

    #[tokio::test]
    async fn test_query_kind_filter() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        index.put(record(user, "a.png", 1, ts(0))).await.unwrap();
        index.put(record(user, "b.pdf", 1, ts(1))).await.unwrap();

        let options = ListOptions {
            kind: Some(FileKind::Image),
            ..Default::default()
        };
        let listed = index.query(user, options).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "a.png");
    }

    #[tokio::test]
    async fn test_sort_ties_preserve_insertion_order() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        // Same size on every record; order must fall back to insertion.
        index.put(record(user, "first.txt", 5, ts(3))).await.unwrap();
        index.put(record(user, "second.txt", 5, ts(1))).await.unwrap();
        index.put(record(user, "third.txt", 5, ts(2))).await.unwrap();

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let options = ListOptions {
                kind: None,
                sort_by: SortField::Size,
                order,
            };
            let listed = index.query(user, options).await.unwrap();
            let names: Vec<&str> = listed.iter().map(|r| r.filename.as_str()).collect();
            assert_eq!(names, ["first.txt", "second.txt", "third.txt"]);
        }
    }

    #[tokio::test]
    async fn test_default_sort_newest_first() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        index.put(record(user, "old.txt", 1, ts(1))).await.unwrap();
        index.put(record(user, "new.txt", 1, ts(9))).await.unwrap();

        let listed = index.query(user, ListOptions::default()).await.unwrap();
        assert_eq!(listed[0].filename, "new.txt");
    }

    #[tokio::test]
    async fn test_search_case_sensitive() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        index.put(record(user, "Report.pdf", 1, ts(0))).await.unwrap();
        index.put(record(user, "report-2.pdf", 1, ts(1))).await.unwrap();

        let matched = index.search(user, "Report").await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].filename, "Report.pdf");

        let matched = index.search(user, "report").await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].filename, "report-2.pdf");
    }

    #[tokio::test]
    async fn test_delete_returns_whether_removed() {
        let index = InMemoryFileIndex::new();
        let user = Uuid::new_v4();
        let stored = index.put(record(user, "a.txt", 1, ts(0))).await.unwrap();

        assert!(index.delete(user, stored.file_id).await.unwrap());
        assert!(!index.delete(user, stored.file_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_store_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.create("a@example.com", "hash").await.unwrap();
        assert!(store.create("a@example.com", "hash").await.is_err());
    }

    #[tokio::test]
    async fn test_user_store_confirm() {
        let store = InMemoryUserStore::new();
        let user = store.create("a@example.com", "hash").await.unwrap();
        assert!(!user.is_confirmed);

        assert!(store.confirm("a@example.com").await.unwrap());
        let user = store.get_by_id(user.id).await.unwrap().unwrap();
        assert!(user.is_confirmed);

        assert!(!store.confirm("missing@example.com").await.unwrap());
    }
}
