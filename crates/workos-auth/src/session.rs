//! Sealed session handle
//!
//! `CookieSession` wraps the raw cookie value together with the password it
//! was sealed with. It answers three questions: is this session valid right
//! now, can it be refreshed, and where does the browser go to end it.

use common::Secret;
use tracing::debug;
use url::Url;

use crate::client::WorkOs;
use crate::constants::{LOGOUT_PATH, TERMINAL_REFRESH_ERRORS, endpoint};
use crate::error::{Error, Result};
use crate::seal::{SessionData, seal_session, unseal_session};
use crate::token::authenticate_with_refresh_token;
use crate::user::{Impersonator, User};

/// Why `authenticate()` did not accept the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticateFailure {
    NoSessionCookieProvided,
    InvalidSessionCookie,
    InvalidJwt,
}

impl AuthenticateFailure {
    pub fn code(self) -> &'static str {
        match self {
            Self::NoSessionCookieProvided => "no_session_cookie_provided",
            Self::InvalidSessionCookie => "invalid_session_cookie",
            Self::InvalidJwt => "invalid_jwt",
        }
    }
}

/// A session that passed validation.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
    pub organization_id: Option<String>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub user: User,
    pub impersonator: Option<Impersonator>,
    pub access_token: String,
}

/// Outcome of `refresh()` when the provider made a decision.
#[derive(Debug, Clone)]
pub enum RefreshResult {
    Refreshed {
        sealed_session: String,
        session: SessionData,
    },
    /// Reason code: `invalid_session_cookie` or the provider's OAuth error
    Rejected(String),
}

/// Handle over a sealed session cookie value.
pub struct CookieSession<'a> {
    workos: &'a WorkOs,
    sealed: Option<&'a str>,
    password: &'a Secret<String>,
}

impl<'a> CookieSession<'a> {
    pub(crate) fn new(
        workos: &'a WorkOs,
        sealed: Option<&'a str>,
        password: &'a Secret<String>,
    ) -> Self {
        Self {
            workos,
            sealed,
            password,
        }
    }

    /// Validate the session: unseal the cookie and verify its access token.
    pub async fn authenticate(&self) -> std::result::Result<SessionInfo, AuthenticateFailure> {
        let sealed = match self.sealed {
            Some(s) if !s.is_empty() => s,
            _ => return Err(AuthenticateFailure::NoSessionCookieProvided),
        };

        let session = unseal_session(sealed, self.password)
            .map_err(|_| AuthenticateFailure::InvalidSessionCookie)?;

        if session.access_token.is_empty() {
            return Err(AuthenticateFailure::InvalidSessionCookie);
        }

        let claims = match self.workos.verifier().verify(&session.access_token).await {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "access token rejected");
                return Err(AuthenticateFailure::InvalidJwt);
            }
        };

        Ok(SessionInfo {
            session_id: claims.sid,
            organization_id: claims.org_id,
            role: claims.role,
            permissions: claims.permissions,
            user: session.user,
            impersonator: session.impersonator,
            access_token: session.access_token,
        })
    }

    /// Exchange the session's refresh token and reseal the new tokens with
    /// the same password.
    pub async fn refresh(&self) -> Result<RefreshResult> {
        let rejected =
            || RefreshResult::Rejected(AuthenticateFailure::InvalidSessionCookie.code().into());

        let Some(sealed) = self.sealed.filter(|s| !s.is_empty()) else {
            return Ok(rejected());
        };
        let Ok(current) = unseal_session(sealed, self.password) else {
            return Ok(rejected());
        };
        if current.refresh_token.is_empty() {
            return Ok(rejected());
        }

        let response = match authenticate_with_refresh_token(
            self.workos.http(),
            self.workos.base_url(),
            self.workos.credentials(),
            &current.refresh_token,
        )
        .await
        {
            Ok(r) => r,
            Err(Error::OAuth { code, description })
                if TERMINAL_REFRESH_ERRORS.contains(&code.as_str()) =>
            {
                debug!(code = %code, description = %description, "refresh rejected by provider");
                return Ok(RefreshResult::Rejected(code));
            }
            Err(e) => return Err(e),
        };

        let session = SessionData {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user: response.user,
            impersonator: response.impersonator,
        };
        let sealed_session = seal_session(&session, self.password)?;

        Ok(RefreshResult::Refreshed {
            sealed_session,
            session,
        })
    }

    /// URL that ends the session at WorkOS, optionally sending the browser
    /// on to `return_to` afterwards.
    pub async fn logout_url(&self, return_to: Option<&str>) -> Result<String> {
        let info = self
            .authenticate()
            .await
            .map_err(|reason| Error::NotAuthenticated(reason.code()))?;

        let mut params = vec![("session_id", info.session_id.as_str())];
        if let Some(return_to) = return_to {
            params.push(("return_to", return_to));
        }

        let url = Url::parse_with_params(&endpoint(self.workos.base_url(), LOGOUT_PATH), &params)?;
        Ok(url.into())
    }
}
