//! Session gate state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! The `require_session` middleware executes the I/O implied by each action
//! (calling the provider, writing cookies, redirecting).
//!
//! ```text
//! Validating --Checked(ok)--------------------> Passed    [Proceed]
//! Validating --Checked(no cookie)-------------> Rejected  [RedirectToLogin]
//! Validating --Checked(other reason)----------> Refreshing [Refresh]
//! Refreshing --Refreshed(sealed)--------------> Renewed   [SetCookieAndRetry]
//! Refreshing --RefreshRejected----------------> Rejected  [RedirectToLogin]
//! Refreshing --RefreshFailed------------------> Expired   [RedirectToLogin + clear]
//! ```

use provider::{AuthenticatedSession, UnauthenticatedReason};

/// Gate states for a single request.
#[derive(Debug)]
pub enum GateState {
    /// Cookie not yet checked
    Validating,
    /// Session invalid, refresh in progress
    Refreshing { reason: UnauthenticatedReason },
    /// Session valid; request proceeds to the handler
    Passed(Box<AuthenticatedSession>),
    /// New session issued; browser must replay the request
    Renewed,
    /// User must sign in again; cookie left in place
    Rejected { reason: UnauthenticatedReason },
    /// Refresh failed outright; cookie removed
    Expired,
}

/// Events that drive gate transitions.
#[derive(Debug)]
pub enum GateEvent {
    /// Provider answered `authenticate()`
    Checked(provider::SessionStatus),
    /// Provider issued a replacement sealed session
    Refreshed { sealed_session: String },
    /// Provider declined to refresh
    RefreshRejected(UnauthenticatedReason),
    /// Provider could not be reached or answered unexpectedly
    RefreshFailed,
}

/// Actions the middleware should execute after a transition.
#[derive(Debug, PartialEq, Eq)]
pub enum GateAction {
    /// Run the wrapped handler
    Proceed,
    /// Call `SessionProvider::refresh`
    Refresh,
    /// Store the new cookie and redirect to the original request URI
    SetCookieAndRetry { sealed_session: String },
    /// Redirect to `/login`, optionally removing the session cookie
    RedirectToLogin { clear_cookie: bool },
}

/// Handle a gate transition. Pure function: no I/O.
pub fn handle_event(state: GateState, event: GateEvent) -> (GateState, GateAction) {
    use provider::SessionStatus;

    match (state, event) {
        // --- Validating ---
        (GateState::Validating, GateEvent::Checked(SessionStatus::Authenticated(session))) => (
            GateState::Passed(Box::new(session)),
            GateAction::Proceed,
        ),

        (
            GateState::Validating,
            GateEvent::Checked(SessionStatus::Unauthenticated(
                UnauthenticatedReason::NoSessionCookieProvided,
            )),
        ) => (
            GateState::Rejected {
                reason: UnauthenticatedReason::NoSessionCookieProvided,
            },
            GateAction::RedirectToLogin {
                clear_cookie: false,
            },
        ),

        (GateState::Validating, GateEvent::Checked(SessionStatus::Unauthenticated(reason))) => {
            (GateState::Refreshing { reason }, GateAction::Refresh)
        }

        // --- Refreshing ---
        (GateState::Refreshing { .. }, GateEvent::Refreshed { sealed_session }) => (
            GateState::Renewed,
            GateAction::SetCookieAndRetry { sealed_session },
        ),

        (GateState::Refreshing { .. }, GateEvent::RefreshRejected(reason)) => (
            GateState::Rejected { reason },
            GateAction::RedirectToLogin {
                clear_cookie: false,
            },
        ),

        (GateState::Refreshing { .. }, GateEvent::RefreshFailed) => (
            GateState::Expired,
            GateAction::RedirectToLogin { clear_cookie: true },
        ),

        // --- Invalid transition: fail closed ---
        (_, _) => (
            GateState::Expired,
            GateAction::RedirectToLogin { clear_cookie: true },
        ),
    }
}
