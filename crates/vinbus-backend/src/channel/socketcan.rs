//! SocketCAN bus channel (Linux only)
//!
//! Bridges a raw CAN socket into the broadcast record stream: a background
//! thread reads frames off the socket and fans their 16-byte wire records
//! out to subscribers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, ExtendedId, Frame, Socket};
use tokio::sync::broadcast;
use vinbus_proto::BusFrame;

use super::{BusChannel, ChannelError};
use crate::config::SocketCanBusConfig;

pub struct SocketCanChannel {
    interface: String,
    socket: Arc<Mutex<CanSocket>>,
    records_tx: broadcast::Sender<Vec<u8>>,
}

impl SocketCanChannel {
    pub fn new(config: &SocketCanBusConfig) -> Result<Self, ChannelError> {
        let socket = CanSocket::open(&config.interface).map_err(|e| {
            ChannelError::Open(format!(
                "Failed to open CAN interface '{}': {}",
                config.interface, e
            ))
        })?;
        socket
            .set_read_timeout(Duration::from_millis(100))
            .map_err(|e| ChannelError::Open(format!("Failed to set read timeout: {}", e)))?;

        let reader = CanSocket::open(&config.interface).map_err(|e| {
            ChannelError::Open(format!(
                "Failed to open CAN interface '{}': {}",
                config.interface, e
            ))
        })?;
        reader
            .set_read_timeout(Duration::from_millis(100))
            .map_err(|e| ChannelError::Open(format!("Failed to set read timeout: {}", e)))?;

        let (records_tx, _) = broadcast::channel(1024);
        let channel = Self {
            interface: config.interface.clone(),
            socket: Arc::new(Mutex::new(socket)),
            records_tx: records_tx.clone(),
        };

        // Background listener: blocking reads, fanned out to subscribers.
        let interface = config.interface.clone();
        std::thread::spawn(move || {
            loop {
                match reader.read_frame() {
                    Ok(frame) => {
                        if !frame.is_extended() {
                            continue;
                        }
                        if let Ok(bus_frame) = BusFrame::new(frame.raw_id(), frame.data()) {
                            let _ = records_tx.send(bus_frame.to_wire().to_vec());
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                    Err(e) => {
                        tracing::warn!(interface = %interface, error = %e, "CAN read failed, listener exiting");
                        break;
                    }
                }
            }
        });

        Ok(channel)
    }
}

#[async_trait]
impl BusChannel for SocketCanChannel {
    async fn send(&self, frame: &BusFrame) -> Result<(), ChannelError> {
        let id = ExtendedId::new(frame.id)
            .ok_or_else(|| ChannelError::Send(format!("Invalid extended id: 0x{:X}", frame.id)))?;
        let can_frame = CanFrame::new(id, frame.payload())
            .ok_or_else(|| ChannelError::Send("Payload too long for CAN frame".to_string()))?;

        let socket = Arc::clone(&self.socket);
        tokio::task::spawn_blocking(move || socket.lock().write_frame(&can_frame))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))?
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<u8>> {
        self.records_tx.subscribe()
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}
