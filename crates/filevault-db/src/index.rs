//! Per-user file metadata index.

use async_trait::async_trait;
use filevault_core::models::{FileRecord, ListOptions, NewFileRecord, SortField, SortOrder};
use filevault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Metadata index abstraction.
///
/// Backed by Postgres in production and an in-memory map in tests. All
/// methods take a `user_id` and only ever see that user's rows.
#[async_trait]
pub trait FileIndex: Send + Sync {
    /// Insert a new record and return it with its assigned insertion
    /// sequence. Inserting an existing (user_id, file_id) pair is an error.
    async fn put(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Fetch one record, or None when absent (or owned by someone else).
    async fn get(&self, user_id: Uuid, file_id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// List a user's records with optional kind filter and sorting. Ties on
    /// the sort field preserve insertion order.
    async fn query(&self, user_id: Uuid, options: ListOptions) -> Result<Vec<FileRecord>, AppError>;

    /// Case-sensitive substring search over filenames, newest first.
    async fn search(&self, user_id: Uuid, keyword: &str) -> Result<Vec<FileRecord>, AppError>;

    /// Delete one record. Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, file_id: Uuid) -> Result<bool, AppError>;
}

/// Escape LIKE metacharacters so a keyword is matched literally.
pub fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Filename => "filename",
        SortField::Size => "size",
        SortField::UploadedAt => "uploaded_at",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Postgres-backed file index
#[derive(Clone)]
pub struct PgFileIndex {
    pool: PgPool,
}

impl PgFileIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileIndex for PgFileIndex {
    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert"))]
    async fn put(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            INSERT INTO files (
                file_id, user_id, filename, size, kind, content_type, storage_key, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING file_id, user_id, filename, size, kind, content_type, storage_key,
                      uploaded_at, seq
            "#,
        )
        .bind(record.file_id)
        .bind(record.user_id)
        .bind(&record.filename)
        .bind(record.size)
        .bind(record.kind)
        .bind(&record.content_type)
        .bind(&record.storage_key)
        .bind(record.uploaded_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateKey(format!("File {} already exists", record.file_id))
            }
            _ => AppError::from(e),
        })?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn get(&self, user_id: Uuid, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            SELECT file_id, user_id, filename, size, kind, content_type, storage_key,
                   uploaded_at, seq
            FROM files
            WHERE user_id = $1 AND file_id = $2
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn query(
        &self,
        user_id: Uuid,
        options: ListOptions,
    ) -> Result<Vec<FileRecord>, AppError> {
        // Column and direction come from enums, never from request strings.
        let sql = format!(
            r#"
            SELECT file_id, user_id, filename, size, kind, content_type, storage_key,
                   uploaded_at, seq
            FROM files
            WHERE user_id = $1 AND ($2::file_kind IS NULL OR kind = $2)
            ORDER BY {} {}, seq ASC
            "#,
            sort_column(options.sort_by),
            sort_direction(options.order),
        );

        let rows = sqlx::query_as::<Postgres, FileRecord>(&sql)
            .bind(user_id)
            .bind(options.kind)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self, keyword), fields(db.table = "files", db.operation = "select"))]
    async fn search(&self, user_id: Uuid, keyword: &str) -> Result<Vec<FileRecord>, AppError> {
        let pattern = format!("%{}%", escape_like(keyword));

        // LIKE (not ILIKE): substring matching is case-sensitive.
        let rows = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            SELECT file_id, user_id, filename, size, kind, content_type, storage_key,
                   uploaded_at, seq
            FROM files
            WHERE user_id = $1 AND filename LIKE $2
            ORDER BY uploaded_at DESC, seq ASC
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete"))]
    async fn delete(&self, user_id: Uuid, file_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM files
            WHERE user_id = $1 AND file_id = $2
            "#,
        )
        .bind(user_id)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_sort_column_mapping() {
        assert_eq!(sort_column(SortField::Filename), "filename");
        assert_eq!(sort_column(SortField::Size), "size");
        assert_eq!(sort_column(SortField::UploadedAt), "uploaded_at");
        assert_eq!(sort_direction(SortOrder::Asc), "ASC");
        assert_eq!(sort_direction(SortOrder::Desc), "DESC");
    }
}
