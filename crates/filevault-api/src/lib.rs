//! FileVault API Library
//!
//! This crate provides the HTTP API handlers, authentication middleware, and
//! application setup for the multi-tenant file storage service.

// Module declarations
mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::FileAccessService;
