//! Hosted sign-in URL construction
//!
//! Builds the User Management authorization URL the browser is redirected to.
//! With `provider=authkit` WorkOS renders its hosted AuthKit UI and, once the
//! user signs in, redirects back to `redirect_uri` with a `code` parameter.

use url::Url;

use crate::constants::{AUTHORIZE_PATH, endpoint};
use crate::error::Result;

/// Parameters for the authorization URL.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlOptions<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    /// `authkit` for the hosted UI, or a specific OAuth provider name
    pub provider: &'a str,
    /// Opaque value echoed back on the callback
    pub state: Option<&'a str>,
}

/// Build the full authorization URL with all required query parameters.
pub fn authorization_url(base_url: &str, options: &AuthorizationUrlOptions<'_>) -> Result<String> {
    let mut params = vec![
        ("client_id", options.client_id),
        ("provider", options.provider),
        ("redirect_uri", options.redirect_uri),
        ("response_type", "code"),
    ];
    if let Some(state) = options.state {
        params.push(("state", state));
    }

    let url = Url::parse_with_params(&endpoint(base_url, AUTHORIZE_PATH), &params)?;
    Ok(url.into())
}
