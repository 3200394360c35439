//! WorkOS-backed session provider
//!
//! Implements the `SessionProvider` trait on top of the `workos-auth` client:
//! AuthKit sign-in URL, code exchange with sealing, cookie validation, refresh,
//! and logout URL. Holds the cookie password so the routes never see it.

use common::Secret;
use provider::{
    AuthenticatedSession, BoxFuture, CodeAuthentication, ProviderError, RefreshOutcome,
    SessionProvider, SessionStatus, UnauthenticatedReason, User,
};
use workos_auth::{AuthenticateFailure, RefreshResult, WorkOs};

/// Session provider backed by WorkOS User Management.
pub struct WorkOsProvider {
    workos: WorkOs,
    cookie_password: Secret<String>,
    redirect_uri: String,
    logout_return_to: Option<String>,
}

impl WorkOsProvider {
    pub fn new(
        workos: WorkOs,
        cookie_password: Secret<String>,
        redirect_uri: String,
        logout_return_to: Option<String>,
    ) -> Self {
        Self {
            workos,
            cookie_password,
            redirect_uri,
            logout_return_to,
        }
    }
}

impl SessionProvider for WorkOsProvider {
    fn id(&self) -> &str {
        "workos"
    }

    fn authorization_url(&self) -> provider::Result<String> {
        self.workos
            .authorization_url(&self.redirect_uri, None)
            .map_err(map_error)
    }

    fn authenticate_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> BoxFuture<'a, provider::Result<CodeAuthentication>> {
        Box::pin(async move {
            let sealed = self
                .workos
                .authenticate_with_code(code, &self.cookie_password)
                .await
                .map_err(map_error)?;

            Ok(CodeAuthentication {
                user: map_user(sealed.response.user),
                sealed_session: sealed.sealed_session,
            })
        })
    }

    fn authenticate<'a>(&'a self, sealed: Option<&'a str>) -> BoxFuture<'a, SessionStatus> {
        Box::pin(async move {
            let session = self.workos.load_sealed_session(sealed, &self.cookie_password);
            match session.authenticate().await {
                Ok(info) => SessionStatus::Authenticated(AuthenticatedSession {
                    session_id: info.session_id,
                    user: map_user(info.user),
                    organization_id: info.organization_id,
                    role: info.role,
                    permissions: info.permissions,
                }),
                Err(failure) => SessionStatus::Unauthenticated(map_failure(failure)),
            }
        })
    }

    fn refresh<'a>(
        &'a self,
        sealed: Option<&'a str>,
    ) -> BoxFuture<'a, provider::Result<RefreshOutcome>> {
        Box::pin(async move {
            let session = self.workos.load_sealed_session(sealed, &self.cookie_password);
            match session.refresh().await.map_err(map_error)? {
                RefreshResult::Refreshed {
                    sealed_session,
                    session,
                } => Ok(RefreshOutcome::Refreshed {
                    sealed_session,
                    user: map_user(session.user),
                }),
                RefreshResult::Rejected(code) => {
                    Ok(RefreshOutcome::Rejected(reason_from_code(&code)))
                }
            }
        })
    }

    fn logout_url<'a>(
        &'a self,
        sealed: Option<&'a str>,
    ) -> BoxFuture<'a, provider::Result<String>> {
        Box::pin(async move {
            self.workos
                .load_sealed_session(sealed, &self.cookie_password)
                .logout_url(self.logout_return_to.as_deref())
                .await
                .map_err(map_error)
        })
    }
}

fn map_user(user: workos_auth::User) -> User {
    User {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }
}

fn map_failure(failure: AuthenticateFailure) -> UnauthenticatedReason {
    match failure {
        AuthenticateFailure::NoSessionCookieProvided => {
            UnauthenticatedReason::NoSessionCookieProvided
        }
        AuthenticateFailure::InvalidSessionCookie => UnauthenticatedReason::InvalidSessionCookie,
        AuthenticateFailure::InvalidJwt => UnauthenticatedReason::InvalidJwt,
    }
}

fn reason_from_code(code: &str) -> UnauthenticatedReason {
    match code {
        "no_session_cookie_provided" => UnauthenticatedReason::NoSessionCookieProvided,
        "invalid_session_cookie" => UnauthenticatedReason::InvalidSessionCookie,
        "invalid_jwt" => UnauthenticatedReason::InvalidJwt,
        other => UnauthenticatedReason::Provider(other.to_string()),
    }
}

fn map_error(err: workos_auth::Error) -> ProviderError {
    use workos_auth::Error;

    match err {
        Error::OAuth { code, description } => ProviderError::Auth(format!("{code}: {description}")),
        Error::NotAuthenticated(code) => ProviderError::NotAuthenticated(reason_from_code(code)),
        e @ (Error::Http(_) | Error::TokenExchange(_) | Error::Jwks(_)) => {
            ProviderError::Unavailable(e.to_string())
        }
        e => ProviderError::Internal(e.to_string()),
    }
}
