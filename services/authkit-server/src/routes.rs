//! Session routes
//!
//! `/login` sends the browser to the hosted sign-in page, `/callback` turns
//! the returned code into a sealed session cookie, `/dashboard` is the gated
//! page, `/logout` ends the session at the provider.

use axum::Extension;
use axum::extract::{RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use provider::AuthenticatedSession;
use tracing::{debug, error, info, warn};

use crate::AppState;
use crate::error::Error;
use crate::metrics::{AuthEvent, record_auth_event};

/// Name of the cookie holding the sealed session.
pub const SESSION_COOKIE: &str = "wos-session";

/// Session cookie with the attributes every write uses.
pub fn session_cookie(sealed_session: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sealed_session))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie passed to `CookieJar::remove`; name and path must match the one set.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_owned())]).into_response()
}

/// Raw cookie value, if the request carried one.
pub fn cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_owned())
}

pub async fn index() -> &'static str {
    "Hello World!"
}

pub async fn login(State(state): State<AppState>) -> Result<Response, Error> {
    let url = state.provider.authorization_url().map_err(|e| {
        error!(error = %e, "failed to build authorization URL");
        Error::AuthorizationUrl(e.to_string())
    })?;

    record_auth_event(AuthEvent::LoginRedirect);
    Ok(found(&url))
}

/// Every non-empty `code` value in the query string, in order.
fn callback_codes(query: Option<&str>) -> Vec<String> {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, value)| key == "code" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect()
}

pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let code = match callback_codes(query.as_deref()).as_slice() {
        [] => return Err(Error::MissingCode),
        [code] => code.clone(),
        codes => {
            record_auth_event(AuthEvent::CodeExchangeFailed);
            warn!(count = codes.len(), "callback carried more than one code");
            return Ok(found("/login"));
        }
    };

    match state.provider.authenticate_with_code(&code).await {
        Ok(auth) => {
            record_auth_event(AuthEvent::CodeExchanged);
            info!(user_id = %auth.user.id, "authorization code exchanged");
            let jar = jar.add(session_cookie(auth.sealed_session));
            Ok((jar, found("/dashboard")).into_response())
        }
        Err(e) => {
            record_auth_event(AuthEvent::CodeExchangeFailed);
            warn!(error = %e, "authorization code exchange failed");
            Ok(found("/login"))
        }
    }
}

pub async fn dashboard(Extension(session): Extension<AuthenticatedSession>) -> &'static str {
    info!(
        user_id = %session.user.id,
        session_id = %session.session_id,
        "User {} is logged in",
        session.user.display_name()
    );
    "Dashboard"
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let sealed = cookie_value(&jar);

    let location = match state.provider.logout_url(sealed.as_deref()).await {
        Ok(url) => url,
        Err(e) => {
            debug!(error = %e, "no logout URL for session, sending to login");
            "/login".to_owned()
        }
    };

    record_auth_event(AuthEvent::Logout);
    (jar.remove(removal_cookie()), found(&location)).into_response()
}
