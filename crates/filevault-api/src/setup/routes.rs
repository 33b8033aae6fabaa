//! Route configuration and setup.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use filevault_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::{auth_middleware, AuthLayerState, CredentialSource};
use crate::constants::MULTIPART_OVERHEAD_BYTES;
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = setup_auth_state(config, &state)?;

    let public_routes = public_routes(state.clone());
    let protected_routes = protected_routes(state.clone()).layer(
        axum::middleware::from_fn_with_state(Arc::new(auth_state), auth_middleware),
    );

    // A file at exactly the size cap still has to fit inside its multipart
    // framing, so the body limit carries some slack; the service enforces
    // the exact cap on the decoded payload.
    let body_limit = config.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = public_routes
        .merge(protected_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        // A misconfigured origin fails startup instead of silently locking
        // every browser out.
        CorsLayer::new()
            .allow_origin(parse_origins(config.cors_origins())?)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn parse_origins(origins: &[String]) -> Result<Vec<HeaderValue>, anyhow::Error> {
    origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|err| anyhow::anyhow!("Invalid CORS origin {:?}: {}", origin, err))
        })
        .collect()
}

fn setup_auth_state(config: &Config, state: &Arc<AppState>) -> Result<AuthLayerState, anyhow::Error> {
    let sources: Result<Vec<CredentialSource>, _> = config
        .auth_token_sources()
        .iter()
        .map(|s| s.parse())
        .collect();

    Ok(AuthLayerState::new(state.verifier.clone(), sources?))
}

fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/confirm", post(handlers::auth::confirm))
        .route("/auth/login", post(handlers::auth::login))
        .route("/objects/{*key}", get(handlers::objects::serve_object))
        .with_state(state)
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/files/upload", post(handlers::files::upload_file))
        .route("/files/list", get(handlers::files::list_files))
        .route("/files/search", get(handlers::files::search_files))
        .route("/files/{id}", get(handlers::files::get_file))
        .route("/files/{id}", delete(handlers::files::delete_file))
        .route("/files/{id}/download", get(handlers::files::download_file))
        .route("/files/{id}/preview", get(handlers::files::preview_file))
        .with_state(state)
}
