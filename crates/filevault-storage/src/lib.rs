//! Filevault storage library
//!
//! This crate provides the object storage abstraction and implementations
//! for Filevault. It includes the Storage trait and backends for S3 and the
//! local filesystem.
//!
//! # Storage key format
//!
//! Objects are user-scoped. All backends use the same key layout:
//!
//! - `{user_id}/{file_id}{extension}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signer;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
pub use factory::create_storage;
pub use filevault_core::StorageBackend;
pub use keys::object_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signer::UrlSigner;
pub use traits::{Storage, StorageError, StorageResult, UrlPurpose};
