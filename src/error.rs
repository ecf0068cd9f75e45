/*
 * Responsibility
 * - request-path AppError
 * - IntoResponse (status + plain-text body)
 * - convert VerifyError into the uniform "unauthenticated" outcome
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::verifier::VerifyError;

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Authentication token not provided.";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Token verification failed.";

#[derive(Debug, Error)]
pub enum AppError {
    /// No `Authorization` header, or one without the `Bearer ` scheme.
    #[error("missing credentials")]
    MissingCredentials,
    /// Verifier rejected the token (invalid, expired, revoked, ...).
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// Verifier could not be reached or returned garbage.
    #[error("verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every outcome is 403; only the message differs.
        let message = match self {
            AppError::MissingCredentials => MISSING_CREDENTIALS_MESSAGE,
            AppError::InvalidToken(_) | AppError::VerifierUnavailable(_) => {
                VERIFICATION_FAILED_MESSAGE
            }
        };

        (StatusCode::FORBIDDEN, message).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::ServiceUnavailable(reason) => AppError::VerifierUnavailable(reason),
            other @ (VerifyError::InvalidToken(_) | VerifyError::ExpiredToken) => {
                AppError::InvalidToken(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_credentials_is_403_with_message() {
        let resp = AppError::MissingCredentials.into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(resp).await, "Authentication token not provided.");
    }

    #[tokio::test]
    async fn every_verifier_failure_looks_the_same_to_the_client() {
        for err in [
            VerifyError::InvalidToken("bad signature".into()),
            VerifyError::ExpiredToken,
            VerifyError::ServiceUnavailable("connection refused".into()),
        ] {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
            assert_eq!(body_text(resp).await, "Token verification failed.");
        }
    }

    #[test]
    fn keeps_the_cause_for_logging() {
        let err = AppError::from(VerifyError::ExpiredToken);
        assert!(matches!(err, AppError::InvalidToken(ref m) if m.contains("expired")));
    }
}
