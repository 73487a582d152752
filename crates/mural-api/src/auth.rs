use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{error, info};

use mural_types::api::LoginRequest;

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::security;
use crate::state::AppState;

/// POST /login. Answers with the bare token as the response body.
///
/// A failed user lookup is reported as 404 whether the email is unknown or
/// the store itself failed; the store error is logged.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = match state.users.find_by_email(&req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::NotFound("user not found".into())),
        Err(e) => {
            error!("User lookup failed: {:#}", e);
            return Err(AppError::NotFound(format!("{:#}", e)));
        }
    };

    security::verify_password(&user.password_hash, &req.password)?;

    let token = state.tokens.issue(user.id).map_err(|e| {
        error!("Token signing failed: {:#}", e);
        AppError::Internal(e.to_string())
    })?;

    info!(user_id = user.id, "Login succeeded");
    Ok(token)
}
