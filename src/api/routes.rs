/*
 * Responsibility
 * - URL layout
 * - which routes sit behind the bearer gate (all of them, for now)
 */
use axum::{Router, routing::get};

use crate::api::handlers::protected::protected;
use crate::middleware::bearer_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let gated = Router::new().route("/protected", get(protected));

    bearer_auth::apply(gated, state)
}
