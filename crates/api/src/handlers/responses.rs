//! Handlers for a file's structured response set.

use axum::extract::{Path, State};
use axum::Json;
use crowdlabel_core::error::CoreError;
use crowdlabel_core::responses::AnnotationResponseSet;
use crowdlabel_core::types::DbId;
use crowdlabel_db::repositories::{DataFileRepo, ResponseRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

async fn ensure_file(pool: &PgPool, mission_id: DbId, file_id: DbId) -> AppResult<()> {
    DataFileRepo::find_in_mission(pool, mission_id, file_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DataFile",
            id: file_id,
        }))
}

/// GET /api/v1/missions/{mission_id}/files/{file_id}/responses
///
/// An empty set when nothing has been saved yet.
pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((mission_id, file_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<AnnotationResponseSet>> {
    ensure_file(&state.pool, mission_id, file_id).await?;
    let set = ResponseRepo::find(&state.pool, file_id)
        .await?
        .map(|r| r.into_core())
        .unwrap_or_default();
    Ok(Json(set))
}

/// PUT /api/v1/missions/{mission_id}/files/{file_id}/responses
///
/// Replaces the stored set. Last write wins.
pub async fn put(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((mission_id, file_id)): Path<(DbId, DbId)>,
    Json(set): Json<AnnotationResponseSet>,
) -> AppResult<Json<AnnotationResponseSet>> {
    ensure_file(&state.pool, mission_id, file_id).await?;
    let stored = ResponseRepo::upsert(&state.pool, file_id, &set, auth.user_id).await?;
    tracing::debug!(mission_id, file_id, keys = set.values.len(), "Responses saved");
    Ok(Json(stored.into_core()))
}
