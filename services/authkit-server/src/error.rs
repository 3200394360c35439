//! Route-level errors
//!
//! Most failures in the session flow are answered with a redirect and never
//! surface as errors. The ones that do reach the browser are listed here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// `/callback` was hit without an authorization code
    #[error("No code provided")]
    MissingCode,

    /// The sign-in URL could not be built (bad client ID or base URL)
    #[error("authorization URL unavailable: {0}")]
    AuthorizationUrl(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::MissingCode => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Error::AuthorizationUrl(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_code_is_plain_400() {
        let response = Error::MissingCode.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert_eq!(&body[..], b"No code provided");
    }

    #[tokio::test]
    async fn authorization_url_error_hides_detail() {
        let response =
            Error::AuthorizationUrl("relative URL without a base".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("relative URL"));
    }
}
