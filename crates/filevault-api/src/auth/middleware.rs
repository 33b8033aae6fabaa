//! Credential extraction and verification middleware.
//!
//! Credential sources are checked in the order configured at startup
//! (`AUTH_TOKEN_SOURCES`). The first source that presents a credential wins,
//! even when that credential turns out to be invalid; later sources are not
//! consulted as fallbacks.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::str::FromStr;
use std::sync::Arc;

use super::models::{AuthToken, Identity};
use super::verifier::{AuthFailure, TokenVerifier};
use crate::constants::TOKEN_COOKIE;
use crate::error::HttpAppError;

/// Where a bearer credential may arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `Authorization: Bearer <token>` header.
    Bearer,
    /// `token` cookie, set by the login handler for browser clients.
    Cookie,
}

impl FromStr for CredentialSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bearer" => Ok(CredentialSource::Bearer),
            "cookie" => Ok(CredentialSource::Cookie),
            _ => Err(anyhow::anyhow!("Unknown credential source: {}", s)),
        }
    }
}

/// Shared state for the auth middleware layer.
#[derive(Clone)]
pub struct AuthLayerState {
    pub verifier: TokenVerifier,
    pub sources: Vec<CredentialSource>,
}

impl AuthLayerState {
    pub fn new(verifier: TokenVerifier, sources: Vec<CredentialSource>) -> Self {
        Self { verifier, sources }
    }
}

/// Pull a credential out of one source. `Ok(None)` means the source offered
/// nothing; `Err` means it offered something unusable.
fn extract_credential(
    source: CredentialSource,
    headers: &HeaderMap,
) -> Result<Option<String>, AuthFailure> {
    match source {
        CredentialSource::Bearer => match headers.get(AUTHORIZATION) {
            None => Ok(None),
            Some(value) => {
                let header = value.to_str().map_err(|_| AuthFailure::Malformed)?;
                // Auth scheme names are case-insensitive (RFC 7235).
                let token = match header.split_once(' ') {
                    Some((scheme, rest)) if scheme.eq_ignore_ascii_case("Bearer") => {
                        rest.trim_start_matches(' ')
                    }
                    _ => return Err(AuthFailure::Malformed),
                };
                if token.is_empty() {
                    return Err(AuthFailure::Malformed);
                }
                Ok(Some(token.to_string()))
            }
        },
        CredentialSource::Cookie => Ok(credential_from_cookies(headers)),
    }
}

fn credential_from_cookies(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(COOKIE) {
        let Ok(cookies) = value.to_str() else {
            continue;
        };
        for cookie in cookies.split(';') {
            if let Some(token) = cookie.trim().strip_prefix(TOKEN_COOKIE) {
                if let Some(token) = token.strip_prefix('=') {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }
    None
}

fn resolve_credential(
    sources: &[CredentialSource],
    headers: &HeaderMap,
) -> Result<String, AuthFailure> {
    for source in sources {
        if let Some(token) = extract_credential(*source, headers)? {
            return Ok(token);
        }
    }
    Err(AuthFailure::Missing)
}

pub async fn auth_middleware(
    State(auth): State<Arc<AuthLayerState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match resolve_credential(&auth.sources, request.headers()) {
        Ok(token) => token,
        Err(failure) => {
            tracing::debug!(failure = %failure, "Authentication failed");
            return HttpAppError::from(failure).into_response();
        }
    };

    let claims = match auth.verifier.verify(&token) {
        Ok(claims) => claims,
        Err(failure) => {
            tracing::debug!(failure = %failure, "Authentication failed");
            return HttpAppError::from(failure).into_response();
        }
    };

    request.extensions_mut().insert(Identity {
        user_id: claims.sub,
    });
    request.extensions_mut().insert(AuthToken(token));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            "bearer".parse::<CredentialSource>().unwrap(),
            CredentialSource::Bearer
        );
        assert_eq!(
            "Cookie".parse::<CredentialSource>().unwrap(),
            CredentialSource::Cookie
        );
        assert!("query".parse::<CredentialSource>().is_err());
    }

    #[test]
    fn test_bearer_header_extraction() {
        let headers = headers(&[(AUTHORIZATION, "Bearer abc123")]);
        let token = extract_credential(CredentialSource::Bearer, &headers).unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc123", "BEARER abc123", "BeArEr abc123"] {
            let headers = headers(&[(AUTHORIZATION, value)]);
            let token = extract_credential(CredentialSource::Bearer, &headers).unwrap();
            assert_eq!(token.as_deref(), Some("abc123"), "{}", value);
        }
    }

    #[test]
    fn test_bearer_header_wrong_scheme_is_malformed() {
        let headers = headers(&[(AUTHORIZATION, "Basic abc123")]);
        let result = extract_credential(CredentialSource::Bearer, &headers);
        assert_eq!(result.unwrap_err(), AuthFailure::Malformed);
    }

    #[test]
    fn test_cookie_extraction() {
        let headers = headers(&[(COOKIE, "other=1; token=abc123; more=2")]);
        let token = extract_credential(CredentialSource::Cookie, &headers).unwrap();
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_ignores_prefixed_names() {
        let headers = headers(&[(COOKIE, "token_extra=nope")]);
        let token = extract_credential(CredentialSource::Cookie, &headers).unwrap();
        assert_eq!(token, None);
    }

    #[test]
    fn test_first_source_wins_even_when_invalid() {
        // Bearer header is malformed; the cookie must not be used as a
        // fallback when bearer is configured first.
        let headers = headers(&[(AUTHORIZATION, "Basic abc"), (COOKIE, "token=valid")]);
        let sources = [CredentialSource::Bearer, CredentialSource::Cookie];
        let result = resolve_credential(&sources, &headers);
        assert_eq!(result.unwrap_err(), AuthFailure::Malformed);
    }

    #[test]
    fn test_no_credential_is_missing() {
        let sources = [CredentialSource::Bearer, CredentialSource::Cookie];
        let result = resolve_credential(&sources, &HeaderMap::new());
        assert_eq!(result.unwrap_err(), AuthFailure::Missing);
    }

    #[test]
    fn test_cookie_first_order() {
        let headers = headers(&[(AUTHORIZATION, "Bearer header-token"), (COOKIE, "token=cookie-token")]);
        let sources = [CredentialSource::Cookie, CredentialSource::Bearer];
        assert_eq!(
            resolve_credential(&sources, &headers).unwrap(),
            "cookie-token"
        );
    }
}
