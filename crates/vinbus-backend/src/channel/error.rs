//! Bus channel errors

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ChannelError {
    #[error("Failed to open bus channel: {0}")]
    Open(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Bus channel closed")]
    Closed,

    #[error("Bus channel not supported: {0}")]
    Unsupported(String),
}
