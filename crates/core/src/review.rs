//! File review state machine.
//!
//! ```text
//! pending ──approve──> needs_annotation ──submit──> pending_review ──approve──> approved
//!    │                        ^                          │
//!    └──reject──> rejected    └──────────reject──────────┘
//! ```
//!
//! `approved` and `rejected` are absorbing. Only the `pending_review ->
//! approved` edge counts as a completed contribution.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// States and actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    NeedsAnnotation,
    PendingReview,
    Approved,
    Rejected,
}

/// All valid file status strings.
pub const VALID_FILE_STATUSES: &[&str] = &[
    "pending",
    "needs_annotation",
    "pending_review",
    "approved",
    "rejected",
];

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::NeedsAnnotation => "needs_annotation",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "needs_annotation" => Ok(Self::NeedsAnnotation),
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid file status '{s}'. Must be one of: {}",
                VALID_FILE_STATUSES.join(", ")
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(CoreError::Validation(format!(
                "Invalid review action '{s}'. Must be one of: approve, reject"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A single edge taken by a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: FileStatus,
    pub to: FileStatus,
    /// Whether the file's contributor earns an approved contribution.
    pub counts_approval: bool,
}

/// The edge a review decision takes from `current`, or `None` when the
/// decision is undefined there (the caller treats that as a no-op).
pub fn review_transition(current: FileStatus, action: ReviewAction) -> Option<Transition> {
    use FileStatus as S;
    use ReviewAction as A;

    let to = match (current, action) {
        (S::Pending, A::Approve) => S::NeedsAnnotation,
        (S::Pending, A::Reject) => S::Rejected,
        (S::PendingReview, A::Approve) => S::Approved,
        (S::PendingReview, A::Reject) => S::NeedsAnnotation,
        (S::NeedsAnnotation | S::Approved | S::Rejected, _) => return None,
    };

    Some(Transition {
        from: current,
        to,
        counts_approval: current == S::PendingReview && to == S::Approved,
    })
}

/// The edge an annotation submission takes from `current`.
///
/// Submission is the only way out of `needs_annotation`.
pub fn submission_transition(current: FileStatus) -> Option<Transition> {
    (current == FileStatus::NeedsAnnotation).then_some(Transition {
        from: current,
        to: FileStatus::PendingReview,
        counts_approval: false,
    })
}

/// Every state reachable from `current` in one step.
pub fn successors(current: FileStatus) -> Vec<FileStatus> {
    let mut next: Vec<FileStatus> = [ReviewAction::Approve, ReviewAction::Reject]
        .into_iter()
        .filter_map(|a| review_transition(current, a))
        .chain(submission_transition(current))
        .map(|t| t.to)
        .collect();
    next.dedup();
    next
}

/// Like [`review_transition`] but with a descriptive error, for server-side
/// callers that report undefined decisions instead of ignoring them.
pub fn validate_review(current: FileStatus, action: ReviewAction) -> Result<Transition, CoreError> {
    review_transition(current, action).ok_or_else(|| {
        CoreError::Conflict(format!(
            "Cannot {} a file in status '{current}'",
            action.as_str()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [FileStatus; 5] = [
        FileStatus::Pending,
        FileStatus::NeedsAnnotation,
        FileStatus::PendingReview,
        FileStatus::Approved,
        FileStatus::Rejected,
    ];

    #[test]
    fn one_step_reachability_is_closed() {
        assert_eq!(
            successors(FileStatus::Pending),
            vec![FileStatus::NeedsAnnotation, FileStatus::Rejected]
        );
        assert_eq!(
            successors(FileStatus::PendingReview),
            vec![FileStatus::Approved, FileStatus::NeedsAnnotation]
        );
        assert_eq!(
            successors(FileStatus::NeedsAnnotation),
            vec![FileStatus::PendingReview]
        );
        assert!(successors(FileStatus::Approved).is_empty());
        assert!(successors(FileStatus::Rejected).is_empty());
    }

    #[test]
    fn terminal_states_absorb_everything() {
        for s in ALL.into_iter().filter(FileStatus::is_terminal) {
            assert!(review_transition(s, ReviewAction::Approve).is_none());
            assert!(review_transition(s, ReviewAction::Reject).is_none());
            assert!(submission_transition(s).is_none());
        }
    }

    #[test]
    fn only_annotation_integration_counts() {
        for s in ALL {
            for a in [ReviewAction::Approve, ReviewAction::Reject] {
                if let Some(t) = review_transition(s, a) {
                    assert_eq!(
                        t.counts_approval,
                        s == FileStatus::PendingReview && a == ReviewAction::Approve
                    );
                }
            }
        }
        let upload = review_transition(FileStatus::Pending, ReviewAction::Approve).unwrap();
        assert!(!upload.counts_approval);
    }

    #[test]
    fn annotation_rejection_loops_back() {
        let t = review_transition(FileStatus::PendingReview, ReviewAction::Reject).unwrap();
        assert_eq!(t.to, FileStatus::NeedsAnnotation);
        assert!(submission_transition(t.to).is_some());
    }

    #[test]
    fn needs_annotation_is_not_a_review_target() {
        let err = validate_review(FileStatus::NeedsAnnotation, ReviewAction::Approve).unwrap_err();
        assert!(err.to_string().contains("needs_annotation"));
    }

    #[test]
    fn status_strings_round_trip() {
        for s in ALL {
            assert_eq!(FileStatus::from_str(s.as_str()).unwrap(), s);
            assert!(VALID_FILE_STATUSES.contains(&s.as_str()));
        }
        assert!(FileStatus::from_str("archived").is_err());
        assert!(ReviewAction::from_str("flag").is_err());
    }
}
