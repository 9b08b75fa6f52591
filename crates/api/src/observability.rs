use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

const HTTP_REQUESTS_TOTAL: &str = "matchroom_api_http_requests_total";
const HTTP_REQUEST_DURATION_SECONDS: &str = "matchroom_api_http_request_duration_seconds";
const STORE_EVENTS_TOTAL: &str = "matchroom_api_store_events_total";
const TRIGGER_FAILURES_TOTAL: &str = "matchroom_api_trigger_failures_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

pub fn register_http_request(method: &str, route: &str, status: StatusCode, elapsed: Duration) {
    let status_code = status.as_u16().to_string();
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_code.clone()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_code
    )
    .record(elapsed.as_secs_f64());
}

pub fn register_store_event(kind: &'static str) {
    counter!(STORE_EVENTS_TOTAL, "kind" => kind).increment(1);
}

pub fn register_trigger_failure(kind: &'static str) {
    counter!(TRIGGER_FAILURES_TOTAL, "kind" => kind).increment(1);
}
