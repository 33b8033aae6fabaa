//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process: an in-memory metadata index, an in-memory
//! user store, and a local storage backend rooted in a temp directory.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use filevault_api::auth::{LocalIdentityProvider, RevocationList, TokenVerifier};
use filevault_api::services::FileAccessService;
use filevault_api::setup::routes::setup_routes;
use filevault_api::state::AppState;
use filevault_core::config::ServiceConfig;
use filevault_core::{Config, StorageBackend};
use filevault_db::{FileIndex, InMemoryFileIndex, InMemoryUserStore, UserStore};
use filevault_storage::{LocalStorage, Storage};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

pub const JWT_SECRET: &str = "test-secret-test-secret-test-secret!";
pub const PASSWORD: &str = "correct horse battery";

/// Test application: server plus handles on its in-memory backends.
pub struct TestApp {
    pub server: TestServer,
    pub index: Arc<InMemoryFileIndex>,
    pub verifier: TokenVerifier,
    _temp_dir: TempDir,
}

fn test_config(storage_path: &str) -> Config {
    Config(Box::new(ServiceConfig {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgresql://unused/test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 5,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 24,
        auth_token_sources: vec!["bearer".to_string(), "cookie".to_string()],
        storage_backend: Some(StorageBackend::Local),
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(storage_path.to_string()),
        local_storage_base_url: Some("http://localhost:4000/objects".to_string()),
        max_file_size_bytes: 5 * 1024 * 1024,
        download_url_ttl_secs: 60,
        preview_url_ttl_secs: 300,
    }))
}

pub async fn spawn_app() -> TestApp {
    let temp_dir = TempDir::new().expect("create temp dir");
    let config = test_config(&temp_dir.path().to_string_lossy());

    let index = Arc::new(InMemoryFileIndex::new());
    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let local = Arc::new(
        LocalStorage::new(
            temp_dir.path().to_string_lossy().to_string(),
            "http://localhost:4000/objects".to_string(),
            JWT_SECRET.as_bytes().to_vec(),
        )
        .await
        .expect("create local storage"),
    );
    let storage: Arc<dyn Storage> = local.clone();

    let verifier = TokenVerifier::new(JWT_SECRET, RevocationList::new());
    let identity = LocalIdentityProvider::new(
        users,
        JWT_SECRET,
        config.jwt_expiry_hours(),
        verifier.clone(),
    );

    let index_dyn: Arc<dyn FileIndex> = index.clone();
    let files = FileAccessService::new(index_dyn, storage, &config);
    let state = Arc::new(AppState::new(
        files,
        Arc::new(identity),
        verifier.clone(),
        Some(local),
        config.clone(),
    ));

    let router = setup_routes(&config, state).expect("build router");
    let server = TestServer::new(router).expect("start test server");

    TestApp {
        server,
        index,
        verifier,
        _temp_dir: temp_dir,
    }
}

/// Register, confirm, and log in a user; returns a bearer token.
pub async fn register_and_login(app: &TestApp, email: &str) -> String {
    let response = app
        .server
        .post("/auth/register")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let response = app
        .server
        .post("/auth/confirm")
        .json(&json!({ "email": email }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    body["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string()
}

/// Upload a file through the multipart endpoint.
pub async fn upload(
    app: &TestApp,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> TestResponse {
    let part = Part::bytes(data.to_vec())
        .file_name(filename.to_string())
        .mime_type(content_type.to_string());
    let form = MultipartForm::new().add_part("file", part);

    app.server
        .post("/files/upload")
        .authorization_bearer(token)
        .multipart(form)
        .await
}

/// Upload and unwrap the created record's id.
pub async fn upload_ok(
    app: &TestApp,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> uuid::Uuid {
    let response = upload(app, token, filename, content_type, data).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["fileId"]
        .as_str()
        .expect("fileId in upload response")
        .parse()
        .expect("fileId is a uuid")
}

/// Split a signed local URL into its server path-and-query.
pub fn signed_url_path(url: &str) -> &str {
    url.strip_prefix("http://localhost:4000")
        .expect("signed URL points at the test base URL")
}
