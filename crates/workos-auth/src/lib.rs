//! WorkOS User Management client library
//!
//! Provides the hosted sign-in URL, authorization code and refresh token
//! exchange, session sealing, and access token verification used by the
//! AuthKit session server. This crate has no dependency on the server binary
//! and can be tested on its own.
//!
//! Session flow:
//! 1. Server redirects to `WorkOs::authorization_url()`
//! 2. Callback calls `WorkOs::authenticate_with_code()`, stores the sealed session
//! 3. Each gated request runs `CookieSession::authenticate()`
//! 4. On failure other than a missing cookie, `CookieSession::refresh()`
//! 5. Logout sends the browser to `CookieSession::logout_url()`

pub mod authorize;
pub mod client;
pub mod constants;
pub mod error;
pub mod jwks;
pub mod seal;
pub mod session;
pub mod token;
pub mod user;

pub use client::{SealedAuthentication, WorkOs};
pub use constants::*;
pub use error::{Error, Result};
pub use jwks::{AccessTokenClaims, AccessTokenVerifier};
pub use seal::{SessionData, seal_session, unseal_session};
pub use session::{AuthenticateFailure, CookieSession, RefreshResult, SessionInfo};
pub use token::AuthenticationResponse;
pub use user::{Impersonator, User};
