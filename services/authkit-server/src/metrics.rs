//! Prometheus metrics exposition
//!
//! - `http_requests_total` (counter): labels `status`, `method`
//! - `http_request_duration_seconds` (histogram): label `status`
//! - `auth_events_total` (counter): label `event`

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Histogram buckets from 1ms to 10s. Most routes answer locally; the slow
/// tail is code exchange and refresh round-trips to the provider.
const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Session lifecycle events worth counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    LoginRedirect,
    CodeExchanged,
    CodeExchangeFailed,
    SessionValid,
    SessionRefreshed,
    RefreshRejected,
    RefreshFailed,
    Logout,
}

impl AuthEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginRedirect => "login_redirect",
            Self::CodeExchanged => "code_exchanged",
            Self::CodeExchangeFailed => "code_exchange_failed",
            Self::SessionValid => "session_valid",
            Self::SessionRefreshed => "session_refreshed",
            Self::RefreshRejected => "refresh_rejected",
            Self::RefreshFailed => "refresh_failed",
            Self::Logout => "logout",
        }
    }
}

fn builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            DURATION_BUCKETS,
        )
        .expect("histogram buckets must be non-empty")
}

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// The handle's `render()` method produces the Prometheus text exposition
/// format served on `/metrics`.
pub fn install_recorder() -> PrometheusHandle {
    builder()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Handle backed by a recorder that is not installed globally. Used where a
/// second global install would panic (router tests).
#[cfg(test)]
pub fn detached_handle() -> PrometheusHandle {
    builder().build_recorder().handle()
}

/// Record a completed request with status code and HTTP method labels.
pub fn record_request(status: u16, method: &str, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("http_requests_total", "status" => status_str.clone(), "method" => method.to_string())
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "status" => status_str)
        .record(duration_secs);
}

/// Record a session lifecycle event.
pub fn record_auth_event(event: AuthEvent) {
    metrics::counter!("auth_events_total", "event" => event.as_str()).increment(1);
}
