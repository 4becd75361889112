//! Bus channel layer
//!
//! This module abstracts the underlying field bus:
//! - Mock channel with a simulated responder ECU for tests and demos
//! - SocketCAN channel for real interfaces (Linux only, feature `socketcan`)
//!
//! A channel transports raw 16-byte wire records; decoding them into frames
//! (and dropping malformed ones) is the service's job.

pub mod error;
pub mod mock;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;

pub use error::ChannelError;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use vinbus_proto::BusFrame;

use crate::config::BusConfig;

/// Transport-agnostic interface to the field bus
///
/// Subscribers see every record received on the bus; callers subscribe
/// before sending a request so no part of the answer is missed.
#[async_trait]
pub trait BusChannel: Send + Sync {
    /// Put one frame on the bus.
    async fn send(&self, frame: &BusFrame) -> Result<(), ChannelError>;

    /// Subscribe to raw wire records received from the bus.
    fn subscribe(&self) -> broadcast::Receiver<Vec<u8>>;

    /// Name of the underlying interface (e.g., "vcan0", "mock").
    fn interface(&self) -> &str;
}

/// Create a bus channel based on configuration
pub fn create_channel(config: &BusConfig) -> Result<Arc<dyn BusChannel>, ChannelError> {
    match config {
        BusConfig::Mock(cfg) => Ok(Arc::new(mock::MockEcuChannel::new(cfg.clone()))),
        #[cfg(all(target_os = "linux", feature = "socketcan"))]
        BusConfig::SocketCan(cfg) => {
            let channel = socketcan::SocketCanChannel::new(cfg)?;
            Ok(Arc::new(channel))
        }
        #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
        BusConfig::SocketCan(_) => Err(ChannelError::Unsupported(
            "SocketCAN requires Linux and the 'socketcan' feature".to_string(),
        )),
    }
}
