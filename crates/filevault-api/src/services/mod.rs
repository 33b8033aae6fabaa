pub mod files;

pub use files::{DownloadLink, FileAccessService, PreviewLink};
