//! Handlers for mission datasets.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use crowdlabel_core::error::CoreError;
use crowdlabel_core::types::DbId;
use crowdlabel_db::models::dataset::{CreateDataset, DatasetRow};
use crowdlabel_db::repositories::DatasetRepo;

use crate::error::AppResult;
use crate::handlers::missions::find_mission;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_mission_reviewer;
use crate::state::AppState;

/// POST /api/v1/missions/{id}/datasets
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(mission_id): Path<DbId>,
    Json(input): Json<CreateDataset>,
) -> AppResult<(StatusCode, Json<DatasetRow>)> {
    find_mission(&state.pool, mission_id).await?;
    require_mission_reviewer(&state.pool, mission_id, &auth).await?;
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Dataset name must not be empty".into()).into());
    }
    if input.accepted_types.as_ref().is_some_and(|t| t.is_empty()) {
        return Err(CoreError::Validation(
            "accepted_types must list at least one type, or be omitted".into(),
        )
        .into());
    }

    let dataset = DatasetRepo::create(&state.pool, mission_id, &input).await?;
    Ok((StatusCode::CREATED, Json(dataset)))
}
