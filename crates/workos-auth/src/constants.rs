//! WorkOS User Management constants
//!
//! Endpoint paths are relative to the API base URL so tests can point the
//! client at a local mock server.

/// Production API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.workos.com";

/// Hosted sign-in (AuthKit) authorization endpoint
pub const AUTHORIZE_PATH: &str = "/user_management/authorize";

/// Code exchange and token refresh endpoint
pub const AUTHENTICATE_PATH: &str = "/user_management/authenticate";

/// Session logout endpoint the browser is sent to
pub const LOGOUT_PATH: &str = "/user_management/sessions/logout";

/// JWKS endpoint prefix; the client ID is appended as the last segment
pub const JWKS_PATH: &str = "/sso/jwks";

/// Provider value that selects the AuthKit hosted UI
pub const AUTHKIT_PROVIDER: &str = "authkit";

/// Minimum cookie password length accepted for sealing sessions
pub const MIN_COOKIE_PASSWORD_LEN: usize = 32;

/// Provider error codes that end a session on refresh instead of failing it
pub const TERMINAL_REFRESH_ERRORS: &[&str] = &["invalid_grant", "mfa_enrollment", "sso_required"];

/// Join an endpoint path onto a base URL, tolerating a trailing slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
