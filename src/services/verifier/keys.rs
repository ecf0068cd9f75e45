//! Signing-key cache for ID token verification.
//!
//! Keys come from the provider's published JWK set and are kept until the
//! response's `Cache-Control: max-age` runs out. Only public keys are held.
use std::collections::HashMap;
use std::time::Duration;

use axum::http::{HeaderMap, header};
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::Url;

use super::VerifyError;

/// Used when the key endpoint does not send `max-age`.
const FALLBACK_MAX_AGE: Duration = Duration::from_secs(300);
/// Upper bound on how long a fetched key set is trusted, whatever the endpoint says.
const MAX_CACHE_AGE: Duration = Duration::from_secs(24 * 60 * 60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    expires_at: Instant,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now()
    }

    fn lookup(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| VerifyError::InvalidToken(format!("no signing key for kid {kid:?}")))
    }
}

pub struct KeyStore {
    url: Url,
    http: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore").field("url", &self.url).finish()
    }
}

impl KeyStore {
    pub fn new(url: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

        Ok(Self {
            url,
            http,
            cache: RwLock::new(None),
        })
    }

    /// Return the decoding key for `kid`, refreshing the set first if it has expired.
    pub async fn get(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
                return cached.lookup(kid);
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
            return cached.lookup(kid);
        }

        let fresh = self.fetch().await?;
        let key = fresh.lookup(kid);
        *cache = Some(fresh);
        key
    }

    async fn fetch(&self) -> Result<CachedKeys, VerifyError> {
        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| VerifyError::ServiceUnavailable(format!("fetching signing keys: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VerifyError::ServiceUnavailable(format!(
                "signing key endpoint returned {status}"
            )));
        }

        let max_age = max_age(resp.headers())
            .unwrap_or(FALLBACK_MAX_AGE)
            .min(MAX_CACHE_AGE);

        let set: JwkSet = resp
            .json()
            .await
            .map_err(|e| VerifyError::ServiceUnavailable(format!("decoding signing keys: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.as_deref() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid.to_string(), key);
                }
                Err(err) => tracing::warn!(kid, error = %err, "skipping unusable signing key"),
            }
        }

        if keys.is_empty() {
            return Err(VerifyError::ServiceUnavailable(
                "signing key endpoint returned no usable keys".to_string(),
            ));
        }

        tracing::debug!(count = keys.len(), ?max_age, "refreshed signing keys");

        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + max_age,
        })
    }
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("max-age="))
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}


#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test_support::{TEST_KID, jwk_set};
    use super::*;

    fn store_for(server: &MockServer) -> KeyStore {
        let url = Url::parse(&format!("{}/jwk", server.uri())).unwrap();
        KeyStore::new(url).unwrap()
    }

    #[test]
    fn parses_max_age_from_cache_control() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=21600, must-revalidate, no-transform"),
        );
        assert_eq!(max_age(&headers), Some(Duration::from_secs(21600)));

        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        assert_eq!(max_age(&headers), None);
    }

    #[tokio::test]
    async fn caches_keys_until_max_age() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwk"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=3600")
                    .set_body_json(jwk_set()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.get(TEST_KID).await.unwrap();
        store.get(TEST_KID).await.unwrap();
        // `expect(1)` is checked when the server drops.
    }

    #[tokio::test]
    async fn huge_max_age_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=18446744073709551615")
                    .set_body_json(jwk_set()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        store.get(TEST_KID).await.unwrap();
        store.get(TEST_KID).await.unwrap();

        let cache = store.cache.read().await;
        let cached = cache.as_ref().unwrap();
        assert!(cached.expires_at <= Instant::now() + MAX_CACHE_AGE);
    }

    #[tokio::test]
    async fn unknown_kid_is_an_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwk_set()))
            .mount(&server)
            .await;

        let err = store_for(&server).get("someone-elses-key").await.unwrap_err();
        assert!(matches!(err, VerifyError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn endpoint_failure_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = store_for(&server).get(TEST_KID).await.unwrap_err();
        assert!(matches!(err, VerifyError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn garbage_body_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = store_for(&server).get(TEST_KID).await.unwrap_err();
        assert!(matches!(err, VerifyError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn failed_refresh_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwk_set()))
            .mount(&server)
            .await;

        let store = store_for(&server);
        assert!(store.get(TEST_KID).await.is_err());
        assert!(store.get(TEST_KID).await.is_ok());
    }
}
