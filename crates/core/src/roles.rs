//! Well-known account role name constants.
//!
//! These must match the `users.role` check constraint in the initial migration.
//! Per-mission roles are derived separately, see [`crate::contributor`].

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// All valid account roles.
pub const VALID_ACCOUNT_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_USER];

/// Whether the account role grants reviewer rights on every mission.
pub fn is_admin(account_role: &str) -> bool {
    account_role == ROLE_ADMIN
}
