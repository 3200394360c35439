//! Error types for WorkOS User Management operations

/// Errors from WorkOS client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The authenticate endpoint answered with an OAuth error body
    #[error("provider rejected request: {code}: {description}")]
    OAuth { code: String, description: String },

    #[error("failed to seal session: {0}")]
    Seal(String),

    /// Decode, decrypt, or parse failure. Carries no detail on purpose so
    /// callers cannot distinguish tampering from a wrong password.
    #[error("invalid sealed session")]
    InvalidSealedSession,

    #[error("invalid access token: {0}")]
    InvalidAccessToken(String),

    #[error("JWKS fetch failed: {0}")]
    Jwks(String),

    #[error("invalid URL: {0}")]
    Url(String),

    #[error("session not authenticated: {0}")]
    NotAuthenticated(&'static str),
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Url(e.to_string())
    }
}

/// Result alias for WorkOS operations.
pub type Result<T> = std::result::Result<T, Error>;
