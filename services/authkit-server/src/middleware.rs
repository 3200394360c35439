//! Request middleware
//!
//! - `track_requests`: request ID span, counters and latency histogram
//! - `require_session`: drives the session gate for protected routes

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use provider::RefreshOutcome;
use tracing::{Instrument, debug, info_span, warn};

use crate::AppState;
use crate::gate::{GateAction, GateEvent, GateState, handle_event};
use crate::metrics::{AuthEvent, record_auth_event, record_request};
use crate::routes::{cookie_value, found, removal_cookie, session_cookie};

/// Decrements the in-flight counter when the request finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicU64);

impl<'a> InFlightGuard<'a> {
    fn enter(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(counter)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Wrap every request in a `req_<uuid>` span and record its outcome.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let method = request.method().clone();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
    );

    let started = Instant::now();
    let response = {
        let _in_flight = InFlightGuard::enter(&state.metrics.in_flight);
        next.run(request).instrument(span.clone()).await
    };
    let elapsed = started.elapsed();

    state.metrics.requests_total.fetch_add(1, Ordering::Relaxed);
    record_request(response.status().as_u16(), method.as_str(), elapsed.as_secs_f64());
    span.in_scope(|| {
        debug!(
            status = response.status().as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "request completed"
        );
    });

    response
}

/// Gate a route behind a valid session.
///
/// Valid sessions continue with the `AuthenticatedSession` in request
/// extensions. Invalid ones get one refresh attempt; a refreshed session is
/// written back and the browser is sent to the same URI again.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let sealed = cookie_value(&jar);
    let status = state.provider.authenticate(sealed.as_deref()).await;
    let (mut gate, mut action) = handle_event(GateState::Validating, GateEvent::Checked(status));

    loop {
        match action {
            GateAction::Proceed => {
                let GateState::Passed(session) = gate else {
                    return (jar.remove(removal_cookie()), found("/login")).into_response();
                };
                record_auth_event(AuthEvent::SessionValid);
                request.extensions_mut().insert(*session);
                return next.run(request).await;
            }

            GateAction::Refresh => {
                if let GateState::Refreshing { reason } = &gate {
                    debug!(reason = %reason, "session invalid, attempting refresh");
                }
                let event = match state.provider.refresh(sealed.as_deref()).await {
                    Ok(RefreshOutcome::Refreshed { sealed_session, user }) => {
                        debug!(user_id = %user.id, "session refreshed");
                        GateEvent::Refreshed { sealed_session }
                    }
                    Ok(RefreshOutcome::Rejected(reason)) => {
                        record_auth_event(AuthEvent::RefreshRejected);
                        debug!(reason = %reason, "refresh rejected");
                        GateEvent::RefreshRejected(reason)
                    }
                    Err(e) => {
                        record_auth_event(AuthEvent::RefreshFailed);
                        warn!(error = %e, "session refresh failed");
                        GateEvent::RefreshFailed
                    }
                };
                (gate, action) = handle_event(gate, event);
            }

            GateAction::SetCookieAndRetry { sealed_session } => {
                record_auth_event(AuthEvent::SessionRefreshed);
                let target = request
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_owned())
                    .unwrap_or_else(|| "/".to_owned());
                let jar = jar.add(session_cookie(sealed_session));
                return (jar, found(&target)).into_response();
            }

            GateAction::RedirectToLogin { clear_cookie } => {
                if let GateState::Rejected { reason } = &gate {
                    debug!(reason = %reason, "session rejected, redirecting to login");
                }
                if clear_cookie {
                    return (jar.remove(removal_cookie()), found("/login")).into_response();
                }
                return found("/login");
            }
        }
    }
}
