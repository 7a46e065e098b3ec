//! HTTP implementation of the mission store's persistence gateway.
//!
//! [`HttpGateway`] speaks the `/api/v1` REST surface of `crowdlabel-api`
//! and is what a [`Session`](crowdlabel_core::session::Session) uses outside
//! of tests.

pub mod config;
pub mod gateway;

pub use config::ClientConfig;
pub use gateway::HttpGateway;
