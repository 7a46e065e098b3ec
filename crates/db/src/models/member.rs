//! Mission membership rows.

use crowdlabel_core::contributor::{derive_role, MissionContributor, MissionRole};
use crowdlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `mission_members`, joined with the member's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MissionMember {
    pub id: DbId,
    pub mission_id: DbId,
    pub user_id: DbId,
    pub username: String,
    /// Stored display hint.
    pub role: String,
    pub approved_count: i32,
    pub total_count: i32,
    pub joined_at: Timestamp,
}

impl MissionMember {
    /// Domain view of this membership. An unreadable hint falls back to the
    /// derived role.
    pub fn to_contributor(&self) -> MissionContributor {
        MissionContributor {
            user_id: self.user_id,
            role: MissionRole::from_str(&self.role)
                .unwrap_or_else(|_| derive_role(self.approved_count)),
            approved_count: self.approved_count,
            total_count: self.total_count,
        }
    }
}
