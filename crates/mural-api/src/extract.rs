use axum::body::Body;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

const BODY_LIMIT: usize = 1024 * 1024;

/// Reads the whole body, then decodes it. A body that cannot be read is
/// 422; bytes that are not the expected JSON are 400.
pub async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, AppError> {
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|e| AppError::UnreadableBody(format!("failed to read request body: {}", e)))?;

    serde_json::from_slice(&bytes).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// `Json` with the error mapping of [`read_json`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        read_json(req.into_body()).await.map(JsonBody)
    }
}

/// The single numeric path segment of a route, e.g. `{publicacaoId}`.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub u64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        raw.parse::<u64>()
            .map(PathId)
            .map_err(|e| AppError::BadRequest(format!("invalid id '{}': {}", raw, e)))
    }
}
