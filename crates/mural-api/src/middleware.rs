use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// Extract and validate JWT from Authorization header. On success the
/// claims are available to handlers as `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = state.tokens.validate_headers(req.headers())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn log_request(req: Request, next: Next) -> Response {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    info!(method = %req.method(), uri = %req.uri(), host = %host, "request");
    next.run(req).await
}

/// Counts the request, then times it and counts the response status,
/// whatever the outcome.
pub async fn track_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    state.metrics.record_request(&method, &endpoint);

    let response = next.run(req).await;

    state
        .metrics
        .record_response(&method, &endpoint, response.status(), start.elapsed());
    response
}
