pub mod auth;
pub mod datasets;
pub mod files;
pub mod members;
pub mod missions;
pub mod responses;
pub mod tasks;
pub mod templates;
