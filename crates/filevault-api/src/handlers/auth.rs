//! Account handlers: register, confirm, login, logout.

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use filevault_core::models::UserResponse;
use filevault_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthToken;
use crate::constants::TOKEN_COOKIE;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account. The account must be confirmed before login.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid email/password or email taken", body = crate::ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = state.identity.sign_up(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Confirm a registered account.
#[utoipa::path(
    post,
    path = "/auth/confirm",
    tag = "auth",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Account confirmed", body = MessageResponse),
        (status = 404, description = "No such account", body = crate::ErrorResponse),
    )
)]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ConfirmRequest>,
) -> Result<Json<MessageResponse>, HttpAppError> {
    state.identity.confirm(&body.email).await?;
    Ok(Json(MessageResponse {
        message: "Account confirmed".to_string(),
    }))
}

/// Log in. Returns the token in the body and as an HttpOnly cookie so both
/// API clients and browsers can authenticate.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials or unconfirmed account", body = crate::ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Response, HttpAppError> {
    let token = state
        .identity
        .authenticate(&body.email, &body.password)
        .await?;

    let cookie = session_cookie(
        &token.access_token,
        token.expires_in,
        state.config.is_production(),
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|err| AppError::Internal(format!("Invalid cookie value: {}", err)))?;

    let mut response = Json(TokenResponse {
        access_token: token.access_token,
        token_type: "Bearer",
        expires_in: token.expires_in,
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Log out: revoke the presented token and clear the cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = crate::ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(AuthToken(token)): Extension<AuthToken>,
) -> Result<Response, HttpAppError> {
    state.identity.revoke(&token).await?;

    let cookie = session_cookie("", 0, state.config.is_production());
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|err| AppError::Internal(format!("Invalid cookie value: {}", err)))?;

    let mut response = Json(MessageResponse {
        message: "Logged out".to_string(),
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        TOKEN_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
