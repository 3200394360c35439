//! Identity provider abstraction for sealed-cookie sessions
//!
//! Defines the `SessionProvider` trait that decouples the HTTP routes from the
//! identity provider. The server only ever hands the raw cookie value to the
//! provider and acts on the outcome; it never opens the sealed payload itself.
//!
//! Session lifecycle driven through this trait:
//! 1. `authorization_url()` sends the browser to the hosted sign-in page
//! 2. `authenticate_with_code()` turns the callback code into a sealed session
//! 3. `authenticate()` validates the cookie on every gated request
//! 4. `refresh()` swaps an expired session for a new one
//! 5. `logout_url()` ends the session at the provider

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Signed-in user as seen by route handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Name to greet the user with: first name when known, email otherwise.
    pub fn display_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or(&self.email)
    }
}

/// Result of a successful authorization code exchange.
#[derive(Debug, Clone)]
pub struct CodeAuthentication {
    pub user: User,
    /// Cookie value to store under the session cookie name
    pub sealed_session: String,
}

/// Details of a session that passed validation.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub session_id: String,
    pub user: User,
    pub organization_id: Option<String>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

/// Why a session cookie did not authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// The request carried no session cookie at all
    NoSessionCookieProvided,
    /// The cookie could not be unsealed (tampered, wrong password, garbage)
    InvalidSessionCookie,
    /// The access token inside the cookie failed verification or expired
    InvalidJwt,
    /// The provider rejected the session (e.g. `invalid_grant` on refresh)
    Provider(String),
}

impl UnauthenticatedReason {
    /// Wire code used in logs and metrics labels.
    pub fn code(&self) -> &str {
        match self {
            Self::NoSessionCookieProvided => "no_session_cookie_provided",
            Self::InvalidSessionCookie => "invalid_session_cookie",
            Self::InvalidJwt => "invalid_jwt",
            Self::Provider(code) => code,
        }
    }
}

impl fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of validating a session cookie. Validation itself never errors:
/// every failure is folded into a reason.
#[derive(Debug, Clone)]
pub enum SessionStatus {
    Authenticated(AuthenticatedSession),
    Unauthenticated(UnauthenticatedReason),
}

/// Outcome of a refresh attempt that reached a decision.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// New tokens were issued and sealed into a replacement cookie value
    Refreshed { sealed_session: String, user: User },
    /// The session cannot be refreshed; the user must sign in again
    Rejected(UnauthenticatedReason),
}

/// Errors from provider operations (code exchange, refresh, logout).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("session not authenticated: {0}")]
    NotAuthenticated(UnauthenticatedReason),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Boxed future returned by provider operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstraction over the identity provider consumed by the HTTP layer.
///
/// Uses boxed future return types for dyn-compatibility (`Arc<dyn SessionProvider>`).
/// Sealed cookie values are passed as `Option<&str>` so that "no cookie" is
/// the provider's decision to report, not the caller's.
pub trait SessionProvider: Send + Sync {
    /// Identifier for logging and health reporting (e.g. "workos")
    fn id(&self) -> &str;

    /// URL of the hosted sign-in page the browser is redirected to.
    fn authorization_url(&self) -> Result<String>;

    /// Exchange the authorization code from the callback for a sealed session.
    fn authenticate_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, Result<CodeAuthentication>>;

    /// Validate a sealed session cookie.
    fn authenticate<'a>(&'a self, sealed: Option<&'a str>) -> BoxFuture<'a, SessionStatus>;

    /// Exchange the refresh token inside the cookie for a new sealed session.
    ///
    /// `Ok(Rejected)` means the provider made a decision; `Err` means it could
    /// not be reached or answered unexpectedly.
    fn refresh<'a>(&'a self, sealed: Option<&'a str>) -> BoxFuture<'a, Result<RefreshOutcome>>;

    /// Provider URL that terminates the session. Fails when the cookie does
    /// not hold an authenticated session.
    fn logout_url<'a>(&'a self, sealed: Option<&'a str>) -> BoxFuture<'a, Result<String>>;
}
