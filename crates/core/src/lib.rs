//! Domain core for the crowdlabel mission platform.
//!
//! Everything here is pure and synchronous except [`outbox`] and [`session`],
//! which mirror store mutations to a [`gateway::PersistenceGateway`].

pub mod capability;
pub mod catalog;
pub mod contributor;
pub mod error;
pub mod gateway;
pub mod mission;
pub mod outbox;
pub mod paging;
pub mod responses;
pub mod review;
pub mod roles;
pub mod schema;
pub mod session;
pub mod store;
pub mod task_config;
pub mod types;
