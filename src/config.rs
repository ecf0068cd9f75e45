/*
 * Responsibility
 * - read settings from the environment (.env supported): PORT, credential path, key URL
 * - validate values that must be valid (startup fails otherwise)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

/// Google's JWK set for Firebase ID token signing keys.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const DEFAULT_CREDENTIALS_PATH: &str = "service-account-key.json";

/// Largest accepted clock leeway for ID token time checks.
pub const MAX_ID_TOKEN_LEEWAY_SECONDS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Service account key file used to bootstrap the verifier
    pub credentials_path: PathBuf,

    pub jwks_url: Url,
    pub id_token_leeway_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (the process env in production).
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = get("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let credentials_path = get("GOOGLE_APPLICATION_CREDENTIALS")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH));

        let jwks_url = get("FIREBASE_JWKS_URL").unwrap_or_else(|| DEFAULT_JWKS_URL.to_string());
        let jwks_url = Url::parse(&jwks_url).map_err(|_| ConfigError::Invalid("FIREBASE_JWKS_URL"))?;

        let id_token_leeway_seconds = get("ID_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            .min(MAX_ID_TOKEN_LEEWAY_SECONDS);

        Ok(Self {
            addr,
            app_env,
            credentials_path,
            jwks_url,
            id_token_leeway_seconds,
        })
    }
}
