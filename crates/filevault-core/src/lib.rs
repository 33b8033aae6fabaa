//! Filevault core library
//!
//! Domain models, error taxonomy, and configuration shared by every
//! Filevault crate. No I/O lives here; storage and database access are
//! provided by `filevault-storage` and `filevault-db`.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
