//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Where rows map onto a domain type, an `into_core` conversion

pub mod annotation;
pub mod data_file;
pub mod dataset;
pub mod member;
pub mod mission;
pub mod response;
pub mod user;

/// Wrap a domain conversion failure as a decode error.
pub(crate) fn decode_error(err: crowdlabel_core::error::CoreError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}
