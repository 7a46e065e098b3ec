//! Handlers for the `/missions` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use crowdlabel_core::error::CoreError;
use crowdlabel_core::mission::{DataType, Mission, MissionStatus};
use crowdlabel_core::paging::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crowdlabel_core::schema::{validate_for_save, MAX_TITLE_LENGTH};
use crowdlabel_core::types::DbId;
use crowdlabel_db::models::mission::{CreateMission, MissionPage, MissionRow, UpdateMission};
use crowdlabel_db::repositories::MissionRepo;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for listing missions.
#[derive(Debug, Deserialize)]
pub struct ListMissionsParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    #[serde(alias = "skip")]
    pub offset: Option<i64>,
}

/// Load a mission row or fail with 404.
pub(crate) async fn find_mission(pool: &PgPool, id: DbId) -> AppResult<MissionRow> {
    MissionRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Mission",
            id,
        }))
}

fn validate_title(title: &str) -> Result<(), CoreError> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Mission title must be between 1 and {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_goal(goal_count: Option<i32>) -> Result<(), CoreError> {
    match goal_count {
        Some(n) if n < 0 => Err(CoreError::Validation(
            "goal_count must not be negative".into(),
        )),
        _ => Ok(()),
    }
}

/// POST /api/v1/missions
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateMission>,
) -> AppResult<(StatusCode, Json<MissionRow>)> {
    validate_title(&input.title)?;
    DataType::from_str(&input.data_type)?;
    validate_goal(input.goal_count)?;
    validate_for_save(&input.tasks)?;

    let mission = MissionRepo::create(&state.pool, &input, admin.user_id).await?;
    tracing::info!(mission_id = mission.id, user_id = admin.user_id, "Mission created");
    Ok((StatusCode::CREATED, Json(mission)))
}

/// GET /api/v1/missions?status=&limit=&offset=
///
/// Newest first. `skip` is accepted as an alias for `offset`.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListMissionsParams>,
) -> AppResult<Json<DataResponse<MissionPage>>> {
    let status = match params.status.as_deref() {
        Some(s) => Some(MissionStatus::from_str(s)?.as_str()),
        None => None,
    };
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);

    let items = MissionRepo::list(&state.pool, status, limit, offset).await?;
    let total = MissionRepo::count(&state.pool, status).await?;
    Ok(Json(DataResponse {
        data: MissionPage { items, total },
    }))
}

/// GET /api/v1/missions/{id}
///
/// The full mission: schema, datasets, files with annotation history, and
/// contributors.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Mission>> {
    let mission = MissionRepo::snapshot(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Mission",
            id,
        }))?;
    Ok(Json(mission))
}

/// PATCH /api/v1/missions/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMission>,
) -> AppResult<Json<MissionRow>> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(status) = &input.status {
        MissionStatus::from_str(status)?;
    }
    validate_goal(input.goal_count)?;

    let mission = MissionRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Mission",
            id,
        }))?;
    Ok(Json(mission))
}

/// DELETE /api/v1/missions/{id}
///
/// Removes the mission and everything under it.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if MissionRepo::delete(&state.pool, id).await? {
        tracing::info!(mission_id = id, user_id = admin.user_id, "Mission deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Mission",
            id,
        }))
    }
}
