//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the global `admin` account role.
//! - [`rbac::require_mission_reviewer`] -- per-mission reviewer gate.

pub mod auth;
pub mod rbac;
