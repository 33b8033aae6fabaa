//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain.

mod file;
mod user;

// Re-export all models for convenient imports
pub use file::*;
pub use user::*;
