use axum::{extract::FromRequestParts, http::request::Parts};
use filevault_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HttpAppError;

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
    /// Issued-at as a Unix timestamp.
    pub iat: i64,
    /// Token id, used for revocation.
    pub jti: String,
}

/// Authenticated caller, inserted into request extensions by the auth
/// middleware. Every protected handler scopes its work to this user id.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Missing identity".to_string())))
    }
}

/// Raw verified credential, kept alongside [Identity] so logout can revoke
/// the exact token that authenticated the request.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);
