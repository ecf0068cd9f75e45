use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};

use super::keys::KeyStore;
use super::{Claims, TokenVerifier, VerifyError};

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_UID_LEN: usize = 128;

/// Firebase Authentication ID token verifier (RS256, Google-published keys).
///
/// Checks, in order:
/// - header: `alg == RS256`, non-empty `kid`
/// - signature against the key named by `kid`
/// - `exp` (+ leeway), `aud == project_id`, `iss == https://securetoken.google.com/<project_id>`
/// - `iat` present and not in the future, `auth_time` (if present) not in the future
/// - `sub` non-empty and at most 128 chars
#[derive(Debug)]
pub struct FirebaseVerifier {
    project_id: String,
    validation: Validation,
    keys: KeyStore,
}

impl FirebaseVerifier {
    pub fn new(project_id: &str, keys: KeyStore, leeway_seconds: u64) -> Self {
        let issuer = format!("{ISSUER_PREFIX}{project_id}");

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[project_id]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = leeway_seconds;

        Self {
            project_id: project_id.to_string(),
            validation,
            keys,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn check_times(&self, claims: &Claims) -> Result<(), VerifyError> {
        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        let latest = Utc::now().timestamp().saturating_add(leeway);

        let iat = claims
            .iat
            .ok_or_else(|| VerifyError::InvalidToken("missing 'iat' claim".to_string()))?;
        if iat > latest {
            return Err(VerifyError::InvalidToken("'iat' is in the future".to_string()));
        }

        if let Some(auth_time) = claims.auth_time
            && auth_time > latest
        {
            return Err(VerifyError::InvalidToken(
                "'auth_time' is in the future".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::InvalidToken("empty token".to_string()));
        }

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| VerifyError::InvalidToken(format!("malformed header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::InvalidToken(format!(
                "unexpected alg {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VerifyError::InvalidToken("missing 'kid' header".to_string()))?;

        let key = self.keys.get(&kid).await?;

        let claims = jsonwebtoken::decode::<Claims>(token, &key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => VerifyError::ExpiredToken,
                _ => VerifyError::InvalidToken(e.to_string()),
            })?
            .claims;

        if claims.uid.is_empty() || claims.uid.len() > MAX_UID_LEN {
            return Err(VerifyError::InvalidToken(
                "'sub' must be 1 to 128 characters".to_string(),
            ));
        }

        self.check_times(&claims)?;

        Ok(claims)
    }
}
