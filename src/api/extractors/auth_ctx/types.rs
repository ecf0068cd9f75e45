/*
 * Responsibility
 * - the "authenticated request" context handlers see
 * - the bearer gate verifies the token and stores this in request extensions
 *
 * Notes
 * - lives for one request only; never shared across requests
 */
use crate::services::verifier::Claims;

/// Context attached to a request that passed the bearer gate.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref().filter(|e| !e.is_empty())
    }
}
