//! VIN retrieval service
//!
//! Request/response side of the backend: a plain-text session protocol over
//! TCP. A session that sends the literal request token gets the VIN back as
//! raw text; any other token gets no response and a clean close.
//!
//! Each accepted session runs as its own task and drives its own
//! [`BamReassembler`] instance, so concurrent retrievals never share
//! accumulator state. The bus receive loop is bounded by the configured
//! retrieval deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use vinbus_proto::{vin_request, BamReassembler, BusFrame, PGN_VIN};

use crate::channel::{BusChannel, ChannelError};
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// The exact request token a session must send to trigger a retrieval.
pub const REQUEST_TOKEN: &str = "VIN_REQUEST";

/// Maximum bytes read from or written to one session.
pub const MAX_SESSION_BYTES: usize = 1024;

/// Backend service: owns a bus channel and answers VIN request sessions.
pub struct VinService {
    channel: Arc<dyn BusChannel>,
    config: ServiceConfig,
}

impl VinService {
    pub fn new(channel: Arc<dyn BusChannel>, config: ServiceConfig) -> Self {
        Self { channel, config }
    }

    /// Accept sessions until shutdown flips, one task per session.
    pub async fn serve(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ServiceError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServiceError::SessionIo(e.to_string()))?;
        tracing::info!(
            addr = %local_addr,
            interface = %self.channel.interface(),
            "VIN retrieval service listening"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender means the daemon is gone; stop too.
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("VIN retrieval service shutting down");
                        break;
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tracing::debug!(peer = %peer, "Session accepted");
                            let service = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(e) = service.handle_session(stream).await {
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

    /// Handle one request/response session.
    ///
    /// An unrecognized token is a silent no-op: the session closes without
    /// a response and without an error.
    pub async fn handle_session(&self, mut stream: TcpStream) -> Result<(), ServiceError> {
        // The token must arrive in the first TCP segment; a token split
        // across segments reads as a mismatch and the session closes.
        let mut buf = vec![0u8; MAX_SESSION_BYTES];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| ServiceError::SessionIo(e.to_string()))?;

        let request = String::from_utf8_lossy(&buf[..n]);
        let token = request.trim_end_matches(['\r', '\n']);
        if token != REQUEST_TOKEN {
            tracing::debug!(token = %token, "Unrecognized request token, closing session");
            return Ok(());
        }

        let vin = self.retrieve_vin().await?;
        stream
            .write_all(vin.as_bytes())
            .await
            .map_err(|e| ServiceError::SessionIo(e.to_string()))?;
        tracing::info!(vin = %vin, "VIN delivered to session");
        Ok(())
    }

    /// Perform one VIN retrieval over the bus.
    ///
    /// Subscribes before sending the request so the whole BAM answer is
    /// seen, then drives a fresh reassembler until completion or until the
    /// configured deadline expires.
    pub async fn retrieve_vin(&self) -> Result<String, ServiceError> {
        let records = self.channel.subscribe();
        self.channel
            .send(&vin_request(self.config.requester_sa))
            .await?;
        tracing::debug!(
            requester_sa = format_args!("{:02X}", self.config.requester_sa),
            responder_sa = format_args!("{:02X}", self.config.responder_sa),
            "VIN request sent, collecting BAM transfer"
        );

        let deadline = Duration::from_millis(self.config.retrieval_timeout_ms);
        let reassembler = BamReassembler::new(self.config.responder_sa, PGN_VIN)
            .with_strict_sequence(self.config.strict_sequence);

        tokio::time::timeout(deadline, Self::collect(records, reassembler))
            .await
            .map_err(|_| ServiceError::RetrievalTimeout(self.config.retrieval_timeout_ms))?
    }

    async fn collect(
        mut records: broadcast::Receiver<Vec<u8>>,
        mut reassembler: BamReassembler,
    ) -> Result<String, ServiceError> {
        loop {
            let raw = match records.recv().await {
                Ok(raw) => raw,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Bus subscriber lagged, records dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(ChannelError::Closed.into());
                }
            };

            // Malformed records are dropped; they never change state.
            let frame = match BusFrame::from_wire(&raw) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, len = raw.len(), "Dropping malformed frame");
                    continue;
                }
            };

            if let Some(vin) = reassembler.handle_frame(&frame) {
                return Ok(vin);
            }
        }
    }
}
