//! InterceptProxy - client-facing relay that tampers VIN responses

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use vinbus_backend::{MAX_SESSION_BYTES, REQUEST_TOKEN};

use crate::error::ProxyError;
use crate::tamper::tamper_vin;

/// Transparent interception relay.
///
/// Accepts the same session protocol as the backend, forwards matching
/// requests to the downstream backend endpoint and returns the tampered
/// value to the caller. Holds no state across sessions.
pub struct InterceptProxy {
    upstream_addr: SocketAddr,
}

impl InterceptProxy {
    pub fn new(upstream_addr: SocketAddr) -> Self {
        Self { upstream_addr }
    }

    /// Accept sessions until shutdown flips, one task per session.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ProxyError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ProxyError::SessionIo(e.to_string()))?;
        tracing::info!(
            addr = %local_addr,
            upstream = %self.upstream_addr,
            "Intercept proxy listening"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means the daemon is gone; stop too.
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Intercept proxy shutting down");
                        break;
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(peer = %peer, "Session accepted");
                            let proxy = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(e) = proxy.handle_session(stream).await {
                                    tracing::warn!(peer = %peer, error = %e, "Session failed");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Handle one client session: forward, tamper, respond.
    ///
    /// A non-matching token is not forwarded and gets no response; the
    /// session just closes.
    pub async fn handle_session(&self, mut stream: TcpStream) -> Result<(), ProxyError> {
        // Same contract as the backend: the token must arrive in the first
        // TCP segment, a split token reads as a mismatch.
        let mut buf = vec![0u8; MAX_SESSION_BYTES];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| ProxyError::SessionIo(e.to_string()))?;

        let request = String::from_utf8_lossy(&buf[..n]);
        let token = request.trim_end_matches(['\r', '\n']);
        if token != REQUEST_TOKEN {
            tracing::debug!(token = %token, "Unrecognized request token, not forwarding");
            return Ok(());
        }

        let vin = self.fetch_upstream_vin().await?;
        let tampered = tamper_vin(&vin);
        tracing::info!(
            original = %vin,
            tampered = %tampered,
            "VIN intercepted and tampered"
        );

        // The original value never reaches the caller.
        stream
            .write_all(tampered.as_bytes())
            .await
            .map_err(|e| ProxyError::SessionIo(e.to_string()))?;
        Ok(())
    }

    /// Open one session to the backend and retrieve the genuine VIN.
    async fn fetch_upstream_vin(&self) -> Result<String, ProxyError> {
        let mut upstream = TcpStream::connect(self.upstream_addr)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        upstream
            .write_all(REQUEST_TOKEN.as_bytes())
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        // The backend writes the VIN and closes; read until close, bounded
        // by the session maximum.
        let mut buf = Vec::new();
        upstream
            .take(MAX_SESSION_BYTES as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        if buf.is_empty() {
            return Err(ProxyError::EmptyUpstreamResponse);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
