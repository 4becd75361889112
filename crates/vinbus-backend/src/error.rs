//! Backend service errors

use thiserror::Error;
use vinbus_proto::ProtoError;

use crate::channel::ChannelError;

/// Errors that can occur while serving a VIN retrieval session
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bus channel failure (open, send, receive)
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Protocol failure while building a frame to send
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The BAM transfer did not complete within the configured deadline.
    /// Surfaced to the session caller; no partial VIN is ever returned.
    #[error("VIN retrieval timed out after {0} ms")]
    RetrievalTimeout(u64),

    /// Connection-level failure on the request/response session.
    /// Aborts that session only, other sessions are unaffected.
    #[error("Session I/O error: {0}")]
    SessionIo(String),
}
