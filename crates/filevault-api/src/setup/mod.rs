//! Application initialization: telemetry, database, storage, state, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use anyhow::Result;
use axum::Router;
use filevault_core::Config;
use filevault_db::{FileIndex, PgFileIndex, PgUserStore, UserStore};
use std::sync::Arc;

use crate::auth::{LocalIdentityProvider, RevocationList, TokenVerifier};
use crate::services::FileAccessService;
use crate::state::AppState;

/// Wire everything together: connect, migrate, build services and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    crate::telemetry::init_telemetry();
    config.validate()?;

    let pool = database::setup_database(&config).await?;
    let storage_handles = storage::setup_storage(&config).await?;

    let index: Arc<dyn FileIndex> = Arc::new(PgFileIndex::new(pool.clone()));
    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));

    let verifier = TokenVerifier::new(config.jwt_secret(), RevocationList::new());
    let identity = LocalIdentityProvider::new(
        users,
        config.jwt_secret(),
        config.jwt_expiry_hours(),
        verifier.clone(),
    );
    let files = FileAccessService::new(index, storage_handles.storage, &config);

    let state = Arc::new(AppState::new(
        files,
        Arc::new(identity),
        verifier,
        storage_handles.local,
        config.clone(),
    ));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
