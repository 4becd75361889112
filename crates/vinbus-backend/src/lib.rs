//! vinbus-backend - VIN retrieval backend
//!
//! Owns a bus channel, issues the VIN request, drives the BAM reassembler to
//! completion and answers request/response sessions with the resulting VIN.
//!
//! The bus itself is behind the [`BusChannel`] trait so the service runs the
//! same against a simulated responder ECU ([`channel::mock::MockEcuChannel`])
//! or a real SocketCAN interface (feature `socketcan`).

pub mod channel;
pub mod config;
pub mod error;
pub mod service;

pub use channel::{create_channel, BusChannel, ChannelError};
pub use config::{BusConfig, MockBusConfig, ServiceConfig};
pub use error::ServiceError;
pub use service::{VinService, MAX_SESSION_BYTES, REQUEST_TOKEN};
