use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// File kind, derived from the extension of the uploaded filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_kind", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Document,
    Other,
}

impl FileKind {
    /// Classify a filename by its extension. Matching is case-insensitive;
    /// a missing or unrecognized extension maps to `Other`.
    pub fn from_filename(filename: &str) -> FileKind {
        let ext = extension_of(filename).to_lowercase();
        match ext.as_str() {
            ".jpg" | ".jpeg" | ".png" | ".gif" | ".bmp" | ".webp" => FileKind::Image,
            ".mp4" | ".mov" | ".avi" | ".webm" | ".mkv" => FileKind::Video,
            ".pdf" | ".doc" | ".docx" | ".xls" | ".xlsx" | ".ppt" | ".pptx" | ".txt" => {
                FileKind::Document
            }
            _ => FileKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Document => "document",
            FileKind::Other => "other",
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(FileKind::Image),
            "video" => Ok(FileKind::Video),
            "document" => Ok(FileKind::Document),
            "other" => Ok(FileKind::Other),
            _ => Err(anyhow::anyhow!("Invalid file kind: {}", s)),
        }
    }
}

/// Extension of a filename including the leading dot, preserving the
/// original case. `"report.PDF"` -> `".PDF"`, `"README"` -> `""`.
/// A file whose name is only a dot prefix (e.g. `".env"`) has no extension.
pub fn extension_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[idx..],
        _ => "",
    }
}

/// Stored metadata for one uploaded file.
///
/// `seq` is a monotonically increasing insertion counter used only as a
/// sort tie-breaker; it never appears in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub size: i64,
    pub kind: FileKind,
    pub content_type: String,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub seq: i64,
}

/// A file record about to be inserted. `seq` is assigned by the index on
/// insert.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub file_id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub size: i64,
    pub kind: FileKind,
    pub content_type: String,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

/// API-facing view of a file. Never exposes `storage_key` or `seq`.
/// Serialized in camelCase like every other response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordResponse {
    pub file_id: Uuid,
    pub filename: String,
    pub size: i64,
    #[serde(rename = "fileType")]
    pub kind: FileKind,
    pub uploaded_at: DateTime<Utc>,
}

impl From<FileRecord> for FileRecordResponse {
    fn from(record: FileRecord) -> Self {
        FileRecordResponse {
            file_id: record.file_id,
            filename: record.filename,
            size: record.size,
            kind: record.kind,
            uploaded_at: record.uploaded_at,
        }
    }
}

/// Sortable columns for file listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Filename,
    Size,
    UploadedAt,
}

impl Default for SortField {
    fn default() -> Self {
        SortField::UploadedAt
    }
}

impl std::str::FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filename" => Ok(SortField::Filename),
            "size" => Ok(SortField::Size),
            "uploaded_at" | "uploadedAt" => Ok(SortField::UploadedAt),
            _ => Err(anyhow::anyhow!("Invalid sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl std::str::FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Query options for listing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub kind: Option<FileKind>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_images() {
        for name in ["a.jpg", "a.jpeg", "a.png", "a.gif", "a.bmp", "a.webp"] {
            assert_eq!(FileKind::from_filename(name), FileKind::Image, "{}", name);
        }
    }

    #[test]
    fn test_classify_videos() {
        for name in ["a.mp4", "a.mov", "a.avi", "a.webm", "a.mkv"] {
            assert_eq!(FileKind::from_filename(name), FileKind::Video, "{}", name);
        }
    }

    #[test]
    fn test_classify_documents() {
        for name in [
            "a.pdf", "a.doc", "a.docx", "a.xls", "a.xlsx", "a.ppt", "a.pptx", "a.txt",
        ] {
            assert_eq!(
                FileKind::from_filename(name),
                FileKind::Document,
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(FileKind::from_filename("PHOTO.JPG"), FileKind::Image);
        assert_eq!(FileKind::from_filename("Report.PdF"), FileKind::Document);
    }

    #[test]
    fn test_classify_unknown_and_missing_extension() {
        assert_eq!(FileKind::from_filename("archive.zip"), FileKind::Other);
        assert_eq!(FileKind::from_filename("README"), FileKind::Other);
        assert_eq!(FileKind::from_filename(".env"), FileKind::Other);
    }

    #[test]
    fn test_extension_of_preserves_case() {
        assert_eq!(extension_of("Report.PDF"), ".PDF");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(".gitignore"), "");
    }

    #[test]
    fn test_response_hides_storage_key() {
        let record = FileRecord {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "photo.png".to_string(),
            size: 1234,
            kind: FileKind::Image,
            content_type: "image/png".to_string(),
            storage_key: "user/file.png".to_string(),
            uploaded_at: Utc::now(),
            seq: 7,
        };
        let response = FileRecordResponse::from(record);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("storage_key").is_none());
        assert!(json.get("seq").is_none());
        assert_eq!(json["fileType"], "image");
    }

    #[test]
    fn test_response_field_casing() {
        let record = FileRecord {
            file_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "photo.png".to_string(),
            size: 1234,
            kind: FileKind::Image,
            content_type: "image/png".to_string(),
            storage_key: "user/file.png".to_string(),
            uploaded_at: Utc::now(),
            seq: 7,
        };
        let json = serde_json::to_value(FileRecordResponse::from(record)).unwrap();
        for field in ["fileId", "filename", "size", "fileType", "uploadedAt"] {
            assert!(json.get(field).is_some(), "{}", field);
        }
        assert!(json.get("file_id").is_none());
        assert!(json.get("uploaded_at").is_none());
    }
}
