//! Role checks.
//!
//! Account-level checks are extractors. Mission-level checks need the
//! caller's membership row, so they are plain functions handlers call with
//! whatever executor (pool or transaction) they are already using.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crowdlabel_core::error::CoreError;
use crowdlabel_core::roles::is_admin;
use crowdlabel_core::types::DbId;
use crowdlabel_db::repositories::MissionMemberRepo;
use sqlx::PgExecutor;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Requires the `admin` account role. Rejects with 403 otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !is_admin(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Fail with 403 unless `user` may review files and edit the schema of
/// `mission_id`. The decision uses the caller's approved count, never the
/// stored role hint.
pub async fn require_mission_reviewer<'e>(
    executor: impl PgExecutor<'e>,
    mission_id: DbId,
    user: &AuthUser,
) -> AppResult<()> {
    let actor = user.actor();
    if is_admin(&actor.account_role) {
        return Ok(());
    }
    let membership = MissionMemberRepo::find(executor, mission_id, user.user_id)
        .await?
        .map(|m| m.to_contributor());
    actor.require_reviewer(membership.as_ref())?;
    Ok(())
}
