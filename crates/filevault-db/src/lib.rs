//! Filevault database library
//!
//! Repositories over the Postgres metadata store. Every query is scoped by
//! `user_id` so one user's rows are invisible to another; a file that exists
//! but belongs to someone else behaves exactly like a file that does not
//! exist.

pub mod index;
pub mod test_helpers;
pub mod users;

pub use index::{escape_like, FileIndex, PgFileIndex};
pub use test_helpers::{InMemoryFileIndex, InMemoryUserStore};
pub use users::{PgUserStore, UserStore};
