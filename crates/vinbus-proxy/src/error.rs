//! Proxy errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Failure connecting to or talking with the downstream backend.
    /// Aborts the current session only.
    #[error("Upstream backend failure: {0}")]
    Upstream(String),

    /// Connection-level failure on the client-facing session
    #[error("Session I/O error: {0}")]
    SessionIo(String),

    /// The backend closed the session without sending a VIN
    #[error("Backend closed the session without a response")]
    EmptyUpstreamResponse,
}
