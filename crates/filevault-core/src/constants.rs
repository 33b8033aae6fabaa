//! Shared constants.

/// Maximum accepted upload size in bytes (5 MiB). Can be lowered, never
/// raised, via `MAX_FILE_SIZE_MB`.
pub const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// TTL for download (attachment) URLs. Short: single-use intent.
pub const DOWNLOAD_URL_TTL_SECS: u64 = 60;

/// TTL for preview (inline) URLs. Longer: a user may keep a document open.
pub const PREVIEW_URL_TTL_SECS: u64 = 300;

/// Bounded retries for the metadata delete after the object delete
/// succeeded. Exhausting them surfaces `AppError::PartialDelete`.
pub const METADATA_DELETE_RETRIES: u32 = 3;
