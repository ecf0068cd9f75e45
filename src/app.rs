/*
 * Responsibility
 * - tracing / panic hook setup
 * - Config -> credentials -> verifier -> AppState -> Router
 * - axum::serve() until the process is killed
 */
use std::{panic, process};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::credentials::ServiceAccount;
use crate::services::verifier::build_verifier;
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,protected_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        // Production: default behaviour, the server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    let state = build_state(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!(
        "listening on {} in {:?} mode",
        config.addr,
        config.app_env
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    // Loaded once; a bad credential file stops the process before it binds.
    let account = ServiceAccount::from_file(&config.credentials_path)?;
    tracing::info!(
        project_id = %account.project_id,
        client_email = %account.client_email,
        "loaded service account"
    );

    let verifier = build_verifier(config, &account).context("failed to build token verifier")?;

    Ok(AppState::new(verifier))
}

fn build_router(state: AppState) -> Router {
    let router = api::routes(state.clone()).with_state(state);

    middleware::http::apply(router)
}
