//! Bearer token verification.
//!
//! The gate only knows the `TokenVerifier` contract; `FirebaseVerifier` is the
//! production implementation and `build_verifier` wires it from `Config`.
use async_trait::async_trait;
use thiserror::Error;

pub mod claims;
pub mod factory;
pub mod firebase;
pub mod keys;

pub use claims::Claims;
pub use factory::build_verifier;
pub use firebase::FirebaseVerifier;

/// Why a token was not accepted.
///
/// Callers must treat every variant as an authentication failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    ExpiredToken,
    #[error("verifier unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Validates an opaque bearer token and yields its claims.
///
/// Implementations must be cheap to share across requests (`Arc<dyn TokenVerifier>`).
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError>;
}
