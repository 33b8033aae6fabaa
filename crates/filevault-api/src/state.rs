//! Shared application state.

use filevault_core::Config;
use filevault_storage::LocalStorage;
use std::sync::Arc;

use crate::auth::{IdentityProvider, TokenVerifier};
use crate::services::FileAccessService;

/// Application state shared across all handlers.
pub struct AppState {
    pub files: FileAccessService,
    pub identity: Arc<dyn IdentityProvider>,
    pub verifier: TokenVerifier,
    /// Present only when the local backend is configured; serves its signed
    /// object URLs.
    pub local_objects: Option<Arc<LocalStorage>>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        files: FileAccessService,
        identity: Arc<dyn IdentityProvider>,
        verifier: TokenVerifier,
        local_objects: Option<Arc<LocalStorage>>,
        config: Config,
    ) -> Self {
        Self {
            files,
            identity,
            verifier,
            local_objects,
            config,
        }
    }
}
