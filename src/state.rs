/*
 * Responsibility
 * - shared context bound to the Router (AppState)
 *   - verifier: built once at startup, used by every request
 * - Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::services::verifier::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}
