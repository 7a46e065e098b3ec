//! Handlers for mission membership.

use axum::extract::{Path, State};
use axum::Json;
use crowdlabel_core::contributor::MissionRole;
use crowdlabel_core::types::DbId;
use crowdlabel_db::models::member::MissionMember;
use crowdlabel_db::repositories::MissionMemberRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::missions::find_mission;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A membership row plus the role that actually governs permissions.
#[derive(Debug, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: MissionMember,
    pub effective_role: MissionRole,
}

impl From<MissionMember> for MemberView {
    fn from(member: MissionMember) -> Self {
        let effective_role = member.to_contributor().effective_role();
        Self {
            member,
            effective_role,
        }
    }
}

/// POST /api/v1/missions/{id}/join
///
/// Idempotent: joining twice returns the existing membership.
pub async fn join(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(mission_id): Path<DbId>,
) -> AppResult<Json<MemberView>> {
    find_mission(&state.pool, mission_id).await?;
    let member = MissionMemberRepo::join(&state.pool, mission_id, auth.user_id).await?;
    tracing::info!(mission_id, user_id = auth.user_id, "Joined mission");
    Ok(Json(member.into()))
}

/// GET /api/v1/missions/{id}/members
pub async fn list(
    State(state): State<AppState>,
    Path(mission_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<MemberView>>>> {
    find_mission(&state.pool, mission_id).await?;
    let members = MissionMemberRepo::list_for_mission(&state.pool, mission_id)
        .await?
        .into_iter()
        .map(MemberView::from)
        .collect();
    Ok(Json(DataResponse { data: members }))
}
