//! Storage backend setup.

use anyhow::Result;
use filevault_core::Config;
use filevault_storage::{create_local_storage, create_storage, LocalStorage, Storage, StorageBackend};
use std::sync::Arc;

/// The trait object every service works against, plus a concrete handle on
/// the local backend when that is the one configured. The handle drives the
/// signed object-serving route; S3 serves its own presigned URLs.
pub struct StorageHandles {
    pub storage: Arc<dyn Storage>,
    pub local: Option<Arc<LocalStorage>>,
}

pub async fn setup_storage(config: &Config) -> Result<StorageHandles> {
    let handles = match config.storage_backend() {
        Some(StorageBackend::Local) => {
            let local = Arc::new(create_local_storage(config).await?);
            StorageHandles {
                storage: local.clone(),
                local: Some(local),
            }
        }
        _ => StorageHandles {
            storage: create_storage(config).await?,
            local: None,
        },
    };
    tracing::info!(backend = ?handles.storage.backend_type(), "Storage backend ready");
    Ok(handles)
}
