/// Factory: build the request-path `TokenVerifier` from `Config` + the loaded service account.
use std::sync::Arc;

use crate::config::Config;
use crate::services::credentials::ServiceAccount;
use crate::services::verifier::{FirebaseVerifier, TokenVerifier, keys::KeyStore};

pub fn build_verifier(
    config: &Config,
    account: &ServiceAccount,
) -> Result<Arc<dyn TokenVerifier>, reqwest::Error> {
    let keys = KeyStore::new(config.jwks_url.clone())?;
    let verifier = FirebaseVerifier::new(&account.project_id, keys, config.id_token_leeway_seconds);

    tracing::info!(
        project_id = verifier.project_id(),
        jwks_url = %config.jwks_url,
        "token verifier ready"
    );

    Ok(Arc::new(verifier))
}
