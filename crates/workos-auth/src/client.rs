//! WorkOS User Management client

use common::Secret;

use crate::authorize::{AuthorizationUrlOptions, authorization_url};
use crate::constants::{AUTHKIT_PROVIDER, DEFAULT_API_BASE_URL};
use crate::error::Result;
use crate::jwks::AccessTokenVerifier;
use crate::seal::{SessionData, seal_session};
use crate::session::CookieSession;
use crate::token::{AuthenticationResponse, ClientCredentials, authenticate_with_code};

/// Code exchange result with the session already sealed for the cookie.
#[derive(Debug)]
pub struct SealedAuthentication {
    pub response: AuthenticationResponse,
    pub sealed_session: String,
}

/// Client for the subset of User Management the session flow needs.
///
/// Holds one `reqwest::Client` (connection pool) and one JWKS cache; share it
/// behind an `Arc`.
pub struct WorkOs {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    api_key: Secret<String>,
    verifier: AccessTokenVerifier,
}

impl WorkOs {
    /// Client against the production API.
    pub fn new(api_key: Secret<String>, client_id: impl Into<String>) -> Self {
        Self::with_base_url(reqwest::Client::new(), DEFAULT_API_BASE_URL, api_key, client_id)
    }

    /// Client against a custom API base URL (staging, local mock).
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Secret<String>,
        client_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let client_id = client_id.into();
        let verifier = AccessTokenVerifier::new(http.clone(), &base_url, &client_id);
        Self {
            http,
            base_url,
            client_id,
            api_key,
            verifier,
        }
    }

    /// Replace the access token verifier (pinned keys, other algorithm).
    pub fn with_verifier(mut self, verifier: AccessTokenVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn verifier(&self) -> &AccessTokenVerifier {
        &self.verifier
    }

    pub(crate) fn credentials(&self) -> ClientCredentials<'_> {
        ClientCredentials {
            client_id: &self.client_id,
            api_key: &self.api_key,
        }
    }

    /// AuthKit sign-in URL that returns to `redirect_uri`.
    pub fn authorization_url(&self, redirect_uri: &str, state: Option<&str>) -> Result<String> {
        authorization_url(
            &self.base_url,
            &AuthorizationUrlOptions {
                client_id: &self.client_id,
                redirect_uri,
                provider: AUTHKIT_PROVIDER,
                state,
            },
        )
    }

    /// Exchange the callback code and seal the resulting session.
    pub async fn authenticate_with_code(
        &self,
        code: &str,
        cookie_password: &Secret<String>,
    ) -> Result<SealedAuthentication> {
        let response =
            authenticate_with_code(&self.http, &self.base_url, self.credentials(), code).await?;

        let sealed_session = seal_session(
            &SessionData {
                access_token: response.access_token.clone(),
                refresh_token: response.refresh_token.clone(),
                user: response.user.clone(),
                impersonator: response.impersonator.clone(),
            },
            cookie_password,
        )?;

        Ok(SealedAuthentication {
            response,
            sealed_session,
        })
    }

    /// Wrap a cookie value for validation, refresh or logout.
    pub fn load_sealed_session<'a>(
        &'a self,
        sealed: Option<&'a str>,
        cookie_password: &'a Secret<String>,
    ) -> CookieSession<'a> {
        CookieSession::new(self, sealed, cookie_password)
    }
}
