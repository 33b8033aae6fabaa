//! Access token verification.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use super::models::Claims;

/// Why a credential was rejected. Every variant renders as a 401; the
/// variants exist so logs and clients can tell the cases apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing credentials")]
    Missing,
    #[error("Malformed credentials")]
    Malformed,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Rejected,
}

/// In-process set of revoked token ids. Entries expire naturally with the
/// tokens that carry them; the JWT expiry is the durable bound.
#[derive(Clone, Default)]
pub struct RevocationList {
    revoked: Arc<Mutex<HashSet<String>>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, jti: &str) {
        self.revoked.lock().unwrap().insert(jti.to_string());
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.lock().unwrap().contains(jti)
    }
}

/// HS256 token verifier with zero clock leeway. A token is valid until the
/// exact second it expires and not one second longer.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    revocations: RevocationList,
}

impl TokenVerifier {
    pub fn new(secret: &str, revocations: RevocationList) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            revocations,
        }
    }

    pub fn revocations(&self) -> &RevocationList {
        &self.revocations
    }

    /// Verify a token and return its claims. Revoked tokens are rejected
    /// even when their signature and expiry check out.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthFailure::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthFailure::Malformed,
                _ => AuthFailure::Rejected,
            }
        })?;

        if self.revocations.is_revoked(&data.claims.jti) {
            return Err(AuthFailure::Rejected);
        }

        Ok(data.claims)
    }
}
