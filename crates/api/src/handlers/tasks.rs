//! Handlers for a mission's annotation schema.

use axum::extract::{Path, State};
use axum::Json;
use crowdlabel_core::schema::{resolve, validate_for_save, MissionTaskConfig, ResolvedSchema};
use crowdlabel_core::types::DbId;
use crowdlabel_db::repositories::MissionRepo;

use crate::error::AppResult;
use crate::handlers::missions::find_mission;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_mission_reviewer;
use crate::state::AppState;

/// GET /api/v1/missions/{id}/tasks
pub async fn list(
    State(state): State<AppState>,
    Path(mission_id): Path<DbId>,
) -> AppResult<Json<Vec<MissionTaskConfig>>> {
    let mission = find_mission(&state.pool, mission_id).await?;
    Ok(Json(mission.tasks.0))
}

/// POST /api/v1/missions/{id}/tasks
///
/// Replace the schema wholesale. Reviewer only.
pub async fn replace(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(mission_id): Path<DbId>,
    Json(tasks): Json<Vec<MissionTaskConfig>>,
) -> AppResult<Json<Vec<MissionTaskConfig>>> {
    find_mission(&state.pool, mission_id).await?;
    require_mission_reviewer(&state.pool, mission_id, &auth).await?;
    validate_for_save(&tasks)?;

    let mission = MissionRepo::replace_tasks(&state.pool, mission_id, &tasks).await?;
    tracing::info!(
        mission_id,
        user_id = auth.user_id,
        task_count = tasks.len(),
        "Mission schema replaced"
    );
    Ok(Json(mission.map(|m| m.tasks.0).unwrap_or(tasks)))
}

/// GET /api/v1/missions/{id}/tasks/resolved
///
/// Tasks merged with their templates. Entries that cannot be resolved are
/// listed under `issues` instead of failing the request.
pub async fn resolved(
    State(state): State<AppState>,
    Path(mission_id): Path<DbId>,
) -> AppResult<Json<ResolvedSchema>> {
    let mission = find_mission(&state.pool, mission_id).await?;
    Ok(Json(resolve(&mission.tasks.0)))
}
