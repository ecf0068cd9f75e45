/*
 * Responsibility
 * - bearer token gate (extract header -> verify -> reject)
 * - on success, put the verified claims (AuthCtx) into request extensions
 * - every failure is a 403; nothing downstream runs before verification resolves
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Put the bearer gate in front of every route of `router`.
///
/// ```ignore
/// let gated = bearer_auth::apply(Router::new().route("/protected", get(protected)), state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot take a State extractor in axum 0.8, so hand the state over explicitly
    // route_layer: unknown paths stay 404 instead of being gated
    router.route_layer(middleware::from_fn_with_state(state, bearer_auth))
}

/// Outcome of reading the `Authorization` header.
#[derive(Debug, PartialEq, Eq)]
enum BearerHeader<'a> {
    /// No header, or one without the literal `Bearer ` prefix.
    Missing,
    /// Prefix present but the rest is not UTF-8; no verifier can accept it.
    Unreadable,
    Token(&'a str),
}

/// `Authorization: Bearer <token>` -> `<token>`.
///
/// The prefix is matched on raw bytes so that a token with non-ASCII bytes still
/// counts as "provided" and fails verification instead.
fn bearer_token(headers: &HeaderMap) -> BearerHeader<'_> {
    let Some(rest) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.as_bytes().strip_prefix(BEARER_PREFIX.as_bytes()))
    else {
        return BearerHeader::Missing;
    };

    match std::str::from_utf8(rest) {
        Ok(token) => BearerHeader::Token(token),
        Err(_) => BearerHeader::Unreadable,
    }
}

async fn bearer_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = match bearer_token(req.headers()) {
        BearerHeader::Token(token) => token,
        BearerHeader::Missing => return Err(AppError::MissingCredentials),
        BearerHeader::Unreadable => {
            tracing::warn!("token verification failed: bearer token is not valid UTF-8");
            return Err(AppError::InvalidToken("bearer token is not valid UTF-8".to_string()));
        }
    };

    let claims = match state.verifier.verify(token).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "token verification failed");
            return Err(err.into());
        }
    };

    tracing::debug!(uid = %claims.uid, "token verified");

    // middleware -> extractor handoff
    req.extensions_mut().insert(AuthCtx::new(claims));

    Ok(next.run(req).await)
}
