use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Request instrumentation. Each `AppState` owns its own registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    responses: IntCounterVec,
    response_time: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("api_requests_total", "Total number of requests received"),
            &["method", "endpoint"],
        )?;
        let responses = IntCounterVec::new(
            Opts::new("api_responses_total", "Responses sent, by status code"),
            &["method", "endpoint", "status"],
        )?;
        let response_time = HistogramVec::new(
            HistogramOpts::new("api_response_time_seconds", "Request response time"),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(responses.clone()))?;
        registry.register(Box::new(response_time.clone()))?;

        Ok(Self {
            registry,
            requests,
            responses,
            response_time,
        })
    }

    pub fn record_request(&self, method: &str, endpoint: &str) {
        self.requests.with_label_values(&[method, endpoint]).inc();
    }

    pub fn record_response(&self, method: &str, endpoint: &str, status: StatusCode, elapsed: Duration) {
        self.responses
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.response_time
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// GET /metrics
pub async fn scrape(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
