//! Filename search endpoint.

mod helpers;

use axum::http::StatusCode;
use helpers::{register_and_login, spawn_app, upload_ok};
use serde_json::Value;

#[tokio::test]
async fn test_search_is_case_sensitive() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "user@example.com").await;

    upload_ok(&app, &token, "Report.pdf", "application/pdf", b"1").await;
    upload_ok(&app, &token, "report-2.pdf", "application/pdf", b"2").await;
    upload_ok(&app, &token, "notes.txt", "text/plain", b"3").await;

    let response = app
        .server
        .get("/files/search")
        .add_query_param("keyword", "Report")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let matched: Vec<Value> = response.json();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["filename"], "Report.pdf");

    let response = app
        .server
        .get("/files/search")
        .add_query_param("keyword", "report")
        .authorization_bearer(&token)
        .await;
    let matched: Vec<Value> = response.json();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["filename"], "report-2.pdf");
}

#[tokio::test]
async fn test_search_results_newest_first() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "user@example.com").await;

    upload_ok(&app, &token, "log-1.txt", "text/plain", b"1").await;
    upload_ok(&app, &token, "log-2.txt", "text/plain", b"2").await;

    let response = app
        .server
        .get("/files/search")
        .add_query_param("keyword", "log")
        .authorization_bearer(&token)
        .await;
    let matched: Vec<Value> = response.json();
    assert_eq!(matched.len(), 2);
    assert_eq!(matched[0]["filename"], "log-2.txt");
}

#[tokio::test]
async fn test_search_rejects_blank_keyword() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "user@example.com").await;

    for query in [Some("   "), Some(""), None] {
        let mut request = app.server.get("/files/search").authorization_bearer(&token);
        if let Some(keyword) = query {
            request = request.add_query_param("keyword", keyword);
        }
        let response = request.await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{:?}", query);
        let body: Value = response.json();
        assert_eq!(body["code"], "EMPTY_KEYWORD");
    }
}

#[tokio::test]
async fn test_search_scoped_to_user() {
    let app = spawn_app().await;
    let owner = register_and_login(&app, "owner@example.com").await;
    let other = register_and_login(&app, "other@example.com").await;

    upload_ok(&app, &owner, "shared-name.txt", "text/plain", b"1").await;

    let response = app
        .server
        .get("/files/search")
        .add_query_param("keyword", "shared")
        .authorization_bearer(&other)
        .await;
    let matched: Vec<Value> = response.json();
    assert!(matched.is_empty());
}

#[tokio::test]
async fn test_search_treats_keyword_literally() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "user@example.com").await;

    upload_ok(&app, &token, "100%.txt", "text/plain", b"1").await;
    upload_ok(&app, &token, "100x.txt", "text/plain", b"2").await;

    // "%" must not act as a wildcard.
    let response = app
        .server
        .get("/files/search")
        .add_query_param("keyword", "100%")
        .authorization_bearer(&token)
        .await;
    let matched: Vec<Value> = response.json();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["filename"], "100%.txt");
}
