/*
 * Responsibility
 * - GET /protected
 * - greet the caller by the email claim (placeholder label when there is none)
 */
use axum::http::StatusCode;

use crate::api::extractors::AuthCtxExtractor;

/// Shown when the verified token carries no email.
pub const ANONYMOUS_LABEL: &str = "user";

pub async fn protected(AuthCtxExtractor(ctx): AuthCtxExtractor) -> (StatusCode, String) {
    let who = ctx.email().unwrap_or(ANONYMOUS_LABEL);
    (StatusCode::OK, format!("Welcome, {who}!"))
}
