//! Identity provider: account lifecycle and token issuance.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::Utc;
use filevault_core::models::UserResponse;
use filevault_core::AppError;
use filevault_db::UserStore;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use uuid::Uuid;

use super::models::Claims;
use super::verifier::TokenVerifier;

const MIN_PASSWORD_LEN: usize = 8;

/// Access token handed to a client after authentication.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Account lifecycle and credential verification.
///
/// Backed locally by [LocalIdentityProvider]; the trait keeps handlers
/// independent of where accounts actually live.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new, unconfirmed account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserResponse, AppError>;

    /// Confirm a registered account so it can log in.
    async fn confirm(&self, email: &str) -> Result<(), AppError>;

    /// Verify credentials and issue an access token.
    async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AppError>;

    /// Revoke an issued token.
    async fn revoke(&self, token: &str) -> Result<(), AppError>;
}

/// Identity provider over the local user store: Argon2 password hashes and
/// self-issued HS256 tokens.
pub struct LocalIdentityProvider {
    users: Arc<dyn UserStore>,
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    expiry: chrono::Duration,
}

impl LocalIdentityProvider {
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_secret: &str,
        jwt_expiry_hours: i64,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            verifier,
            expiry: chrono::Duration::hours(jwt_expiry_hours),
        }
    }

    fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AppError::Internal(format!("Password hashing failed: {}", err)))
    }

    fn password_matches(password: &str, password_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|err| AppError::Internal(format!("Stored password hash invalid: {}", err)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    fn issue_token(&self, user_id: Uuid) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AppError::Internal(format!("Token signing failed: {}", err)))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.expiry.num_seconds(),
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserResponse, AppError> {
        if !email.contains('@') {
            return Err(AppError::InvalidInput(
                "Email must be a valid address".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = Self::hash_password(password)?;
        let user = self.users.create(email, &password_hash).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    async fn confirm(&self, email: &str) -> Result<(), AppError> {
        if !self.users.confirm(email).await? {
            return Err(AppError::NotFound("Account not found".to_string()));
        }
        tracing::info!("Account confirmed");
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AppError> {
        // One message for every credential failure so callers cannot learn
        // which emails are registered.
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self.users.get_by_email(email).await?.ok_or_else(invalid)?;
        if !Self::password_matches(password, &user.password_hash)? {
            return Err(invalid());
        }
        if !user.is_confirmed {
            return Err(AppError::Unauthorized(
                "Account is not confirmed".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        self.users.record_login(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        self.issue_token(user.id)
    }

    async fn revoke(&self, token: &str) -> Result<(), AppError> {
        let claims = self
            .verifier
            .verify(token)
            .map_err(|failure| AppError::Unauthorized(failure.to_string()))?;
        self.verifier.revocations().revoke(&claims.jti);
        tracing::info!(user_id = %claims.sub, "Token revoked");
        Ok(())
    }
}
