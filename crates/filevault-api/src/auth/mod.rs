//! Authentication: token verification, credential extraction, and the local
//! identity provider.

pub mod middleware;
pub mod models;
pub mod provider;
pub mod verifier;

pub use middleware::{auth_middleware, AuthLayerState, CredentialSource};
pub use models::{AuthToken, Claims, Identity};
pub use provider::{IdentityProvider, IssuedToken, LocalIdentityProvider};
pub use verifier::{AuthFailure, RevocationList, TokenVerifier};
