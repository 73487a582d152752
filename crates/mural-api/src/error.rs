use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use mural_types::api::ErrorResponse;

/// Every failure a handler can produce. The message is sent to the client
/// verbatim in `{"erro": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UnreadableBody(String),

    /// Missing, malformed, expired or forged token.
    #[error("{0}")]
    Unauthenticated(String),

    /// Credentials were checked and rejected.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnreadableBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthenticated(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(msg) = &self {
            error!("Internal error: {}", msg);
        }

        (status, Json(ErrorResponse { erro: self.to_string() })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
