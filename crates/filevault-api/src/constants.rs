//! API-level constants.

/// Cookie that carries the access token for browser clients.
pub const TOKEN_COOKIE: &str = "token";

/// Headroom added to the request body limit so a file at exactly the size
/// cap still fits inside its multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Name of the multipart field that carries the uploaded file.
pub const UPLOAD_FIELD: &str = "file";
