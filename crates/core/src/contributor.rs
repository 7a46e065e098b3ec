//! Per-mission contributor standing and role derivation.
//!
//! The effective mission role is always derived from the contributor's
//! cumulative approved count. The stored `role` column is a display hint and
//! is never consulted for permission checks.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles;
use crate::types::DbId;

/// Approved contributions needed to annotate.
pub const ANNOTATOR_THRESHOLD: i32 = 10;

/// Approved contributions needed to review.
pub const REVIEWER_THRESHOLD: i32 = 50;

/// Mission roles in increasing order of privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionRole {
    Contributor,
    Annotator,
    Reviewer,
}

impl MissionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Annotator => "annotator",
            Self::Reviewer => "reviewer",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "contributor" => Ok(Self::Contributor),
            "annotator" => Ok(Self::Annotator),
            "reviewer" => Ok(Self::Reviewer),
            _ => Err(CoreError::Validation(format!(
                "Invalid mission role '{s}'. Must be one of: contributor, annotator, reviewer"
            ))),
        }
    }
}

/// The role a contributor with `approved_count` approvals holds.
pub fn derive_role(approved_count: i32) -> MissionRole {
    if approved_count >= REVIEWER_THRESHOLD {
        MissionRole::Reviewer
    } else if approved_count >= ANNOTATOR_THRESHOLD {
        MissionRole::Annotator
    } else {
        MissionRole::Contributor
    }
}

/// A user's standing within one mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionContributor {
    pub user_id: DbId,
    /// Display hint only.
    pub role: MissionRole,
    pub approved_count: i32,
    pub total_count: i32,
}

impl MissionContributor {
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            role: MissionRole::Contributor,
            approved_count: 0,
            total_count: 0,
        }
    }

    pub fn effective_role(&self) -> MissionRole {
        derive_role(self.approved_count)
    }

    /// Count one integrated file and refresh the display hint.
    pub fn record_approval(&mut self) {
        self.approved_count += 1;
        self.role = self.effective_role();
    }

    /// Count one uploaded file.
    pub fn record_upload(&mut self) {
        self.total_count += 1;
    }
}

/// The acting user of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: DbId,
    pub name: String,
    /// Global account role (see [`crate::roles`]).
    pub account_role: String,
}

impl Actor {
    /// Whether this actor may review files and edit the schema of a mission
    /// where their standing is `membership`.
    pub fn can_review(&self, membership: Option<&MissionContributor>) -> bool {
        roles::is_admin(&self.account_role)
            || membership.is_some_and(|m| m.effective_role() >= MissionRole::Reviewer)
    }

    /// Reviewer-only gate with a descriptive error.
    pub fn require_reviewer(
        &self,
        membership: Option<&MissionContributor>,
    ) -> Result<(), CoreError> {
        if self.can_review(membership) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(
                "Reviewer role required for this mission".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: &str) -> Actor {
        Actor {
            user_id: 7,
            name: "Ada".into(),
            account_role: role.into(),
        }
    }

    fn member(approved: i32, stored: MissionRole) -> MissionContributor {
        MissionContributor {
            user_id: 7,
            role: stored,
            approved_count: approved,
            total_count: approved,
        }
    }

    #[test]
    fn thresholds_define_roles() {
        assert_eq!(derive_role(0), MissionRole::Contributor);
        assert_eq!(derive_role(ANNOTATOR_THRESHOLD - 1), MissionRole::Contributor);
        assert_eq!(derive_role(ANNOTATOR_THRESHOLD), MissionRole::Annotator);
        assert_eq!(derive_role(REVIEWER_THRESHOLD), MissionRole::Reviewer);
    }

    #[test]
    fn stored_role_is_ignored_for_permissions() {
        let user = actor(roles::ROLE_USER);
        assert!(!user.can_review(Some(&member(3, MissionRole::Reviewer))));
        assert!(user.can_review(Some(&member(60, MissionRole::Contributor))));
        assert!(!user.can_review(None));
    }

    #[test]
    fn admins_review_everywhere() {
        assert!(actor(roles::ROLE_ADMIN).can_review(None));
    }

    #[test]
    fn record_approval_refreshes_hint() {
        let mut m = member(REVIEWER_THRESHOLD - 1, MissionRole::Annotator);
        m.record_approval();
        assert_eq!(m.approved_count, REVIEWER_THRESHOLD);
        assert_eq!(m.role, MissionRole::Reviewer);
    }

    #[test]
    fn require_reviewer_is_forbidden_for_contributors() {
        let err = actor(roles::ROLE_USER)
            .require_reviewer(Some(&member(0, MissionRole::Contributor)))
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }
}
