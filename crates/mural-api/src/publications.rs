//! Publication handlers. Any authenticated user may edit, delete or like
//! any publication; only the token's presence is checked.

use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use anyhow::anyhow;
use tracing::{error, info};

use mural_db::models::{NewPublication, PublicationRow};
use mural_types::api::{Claims, PublicationRequest, PublicationResponse};

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathId, read_json};
use crate::state::AppState;

/// POST /publicacoes. Answers 201 with the stored row, as GET would return it.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<PublicationRequest>,
) -> AppResult<impl IntoResponse> {
    let req = req.prepare().map_err(|e| AppError::BadRequest(e.into()))?;

    let new = NewPublication {
        title: req.title,
        content: req.content,
        author_id: claims.sub,
    };
    let id = state.publications.create(&new).await?;

    info!(publication_id = id, author_id = claims.sub, "Publication created");

    let row = state
        .publications
        .find_by_id(id)
        .await?
        .ok_or_else(|| anyhow!("publication {} vanished after insert", id))?;

    Ok((StatusCode::CREATED, Json(to_response(row))))
}

/// GET /publicacoes: the caller's feed.
pub async fn feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<PublicationResponse>>> {
    let rows = state.publications.list_feed(claims.sub).await?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> AppResult<Json<PublicationResponse>> {
    let row = find_existing(&state, id).await?;
    Ok(Json(to_response(row)))
}

/// The body is only read once the publication is known to exist.
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    body: Body,
) -> AppResult<StatusCode> {
    find_existing(&state, id).await?;

    let req: PublicationRequest = read_json(body).await?;
    let req = req.prepare().map_err(|e| AppError::BadRequest(e.into()))?;

    state.publications.update(id, &req.title, &req.content).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(State(state): State<AppState>, PathId(id): PathId) -> AppResult<StatusCode> {
    find_existing(&state, id).await?;

    state.publications.delete(id).await?;
    info!(publication_id = id, "Publication deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /usuarios/{usuarioId}/publicacoes
pub async fn list_by_user(
    State(state): State<AppState>,
    PathId(user_id): PathId,
) -> AppResult<Json<Vec<PublicationResponse>>> {
    let rows = state.publications.list_by_author(user_id).await?;
    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn like(State(state): State<AppState>, PathId(id): PathId) -> AppResult<StatusCode> {
    state.publications.like(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike(State(state): State<AppState>, PathId(id): PathId) -> AppResult<StatusCode> {
    state.publications.unlike(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lookup failures of either kind surface as 404.
async fn find_existing(state: &AppState, id: u64) -> AppResult<PublicationRow> {
    match state.publications.find_by_id(id).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(AppError::NotFound(format!("publication {} not found", id))),
        Err(e) => {
            error!("Publication lookup failed: {:#}", e);
            Err(AppError::NotFound(format!("{:#}", e)))
        }
    }
}

fn to_response(row: PublicationRow) -> PublicationResponse {
    PublicationResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        author_id: row.author_id,
        author_nick: row.author_nick,
        likes: row.likes,
        created_at: Some(row.created_at.and_utc()),
    }
}
