//! Mock bus channel with a simulated responder ECU

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use vinbus_proto::{BusFrame, PGN_REQUEST, PGN_TP_CM, PGN_TP_DT, PGN_VIN, REQUEST_DA, TP_CM_BAM};

use super::{BusChannel, ChannelError};
use crate::config::MockBusConfig;

/// Simulated responder ECU behind a bus channel.
///
/// Answers a VIN request with a BAM announcement followed by sequential
/// data packets carrying the configured VIN in 7-byte chunks. Tests can
/// inject arbitrary records and silence the ECU to provoke timeouts.
pub struct MockEcuChannel {
    config: MockBusConfig,
    silent: AtomicBool,
    records_tx: broadcast::Sender<Vec<u8>>,
}

impl MockEcuChannel {
    pub fn new(config: MockBusConfig) -> Self {
        let (records_tx, _) = broadcast::channel(256);
        Self {
            config,
            silent: AtomicBool::new(false),
            records_tx,
        }
    }

    /// Stop answering requests (simulates a dead or busy ECU).
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    /// Put a frame on the bus as if some node had transmitted it.
    pub fn inject(&self, frame: &BusFrame) {
        let _ = self.records_tx.send(frame.to_wire().to_vec());
    }

    /// Put a raw record on the bus, malformed ones included.
    pub fn inject_raw(&self, raw: Vec<u8>) {
        let _ = self.records_tx.send(raw);
    }

    fn is_vin_request(frame: &BusFrame) -> bool {
        frame.pgn() == (PGN_REQUEST | u32::from(REQUEST_DA))
            && frame.payload().len() >= 3
            && frame.payload()[0] == (PGN_VIN & 0xFF) as u8
            && frame.payload()[1] == ((PGN_VIN >> 8) & 0xFF) as u8
            && frame.payload()[2] == ((PGN_VIN >> 16) & 0xFF) as u8
    }

    /// Broadcast the BAM sequence announcing and carrying the VIN.
    fn answer_vin_request(&self) {
        let vin = self.config.vin.as_bytes();
        let sa = u32::from(self.config.responder_sa);
        let total = vin.len().min(u8::MAX as usize) as u8;
        let packets = vin.chunks(7).len() as u8;

        let control = [
            TP_CM_BAM,
            total,
            packets,
            0xFF,
            0xFF,
            (PGN_VIN & 0xFF) as u8,
            ((PGN_VIN >> 8) & 0xFF) as u8,
            ((PGN_VIN >> 16) & 0xFF) as u8,
        ];
        self.broadcast((PGN_TP_CM << 8) | sa, &control);

        for (i, chunk) in vin.chunks(7).enumerate() {
            let mut payload = [0xFFu8; 8];
            payload[0] = (i + 1) as u8;
            payload[1..1 + chunk.len()].copy_from_slice(chunk);
            self.broadcast((PGN_TP_DT << 8) | sa, &payload);
        }

        tracing::debug!(
            vin = %self.config.vin,
            packets,
            "Mock ECU answered VIN request"
        );
    }

    fn broadcast(&self, id: u32, payload: &[u8]) {
        // Payloads here are at most 8 bytes by construction.
        if let Ok(frame) = BusFrame::new(id, payload) {
            let _ = self.records_tx.send(frame.to_wire().to_vec());
        }
    }
}

#[async_trait]
impl BusChannel for MockEcuChannel {
    async fn send(&self, frame: &BusFrame) -> Result<(), ChannelError> {
        tracing::trace!(
            id = format_args!("{:08X}", frame.id),
            payload = %hex::encode(frame.payload()),
            "Mock bus send"
        );
        if Self::is_vin_request(frame) && !self.silent.load(Ordering::SeqCst) {
            self.answer_vin_request();
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<u8>> {
        self.records_tx.subscribe()
    }

    fn interface(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use vinbus_proto::{vin_request, BamReassembler};

    use super::*;

    #[tokio::test]
    async fn answers_vin_request_with_bam_sequence() {
        let channel = MockEcuChannel::new(MockBusConfig::default());
        let mut rx = channel.subscribe();
        channel.send(&vin_request(0xFA)).await.unwrap();

        let mut reassembler = BamReassembler::new(0x00, PGN_VIN);
        let mut vin = None;
        // Control packet plus three data packets for a 17-byte VIN.
        for _ in 0..4 {
            let raw = rx.recv().await.unwrap();
            let frame = BusFrame::from_wire(&raw).unwrap();
            if let Some(v) = reassembler.handle_frame(&frame) {
                vin = Some(v);
            }
        }
        assert_eq!(vin.as_deref(), Some("1HGCM82633A123456"));
    }

    #[tokio::test]
    async fn ignores_unrelated_frames() {
        let channel = MockEcuChannel::new(MockBusConfig::default());
        let mut rx = channel.subscribe();
        let noise = BusFrame::new(0x18FEF100, &[0u8; 8]).unwrap();
        channel.send(&noise).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn silent_ecu_never_answers() {
        let channel = MockEcuChannel::new(MockBusConfig::default());
        channel.set_silent(true);
        let mut rx = channel.subscribe();
        channel.send(&vin_request(0xFA)).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
