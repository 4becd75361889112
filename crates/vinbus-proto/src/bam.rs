//! BAM multi-frame reassembly
//!
//! The VIN does not fit in a single 8-byte frame, so the responder announces
//! it with one TP.CM Broadcast Announce Message (total length, packet count,
//! target PGN) followed by sequential TP.DT data packets carrying 7-byte
//! chunks. [`BamReassembler`] consumes decoded frames and reconstructs the
//! value.
//!
//! The input is untrusted: frames may be unrelated traffic, out of order or
//! duplicated. Anything that is not a matching control or data packet from
//! the expected responder is ignored without a state change.

use crate::frame::BusFrame;

/// PGN of TP.CM transport control frames addressed to the global address.
pub const PGN_TP_CM: u32 = 0xECFF;

/// PGN of TP.DT transport data frames addressed to the global address.
pub const PGN_TP_DT: u32 = 0xEBFF;

/// TP.CM control byte announcing a broadcast transfer (BAM).
pub const TP_CM_BAM: u8 = 0x20;

/// A VIN is exactly 17 characters; accumulated bytes are capped here.
pub const VIN_LENGTH: usize = 17;

/// Bytes of message data carried by one TP.DT packet.
const CHUNK_LEN: usize = 7;

#[derive(Debug, Clone)]
enum State {
    Idle,
    Collecting {
        total_length: usize,
        expected_packets: u8,
        received: u8,
        buf: Vec<u8>,
    },
    Complete(String),
}

/// State machine reconstructing one broadcast-announced value.
///
/// One reassembler serves exactly one retrieval; concurrent retrievals need
/// independent instances (mixing accumulators would corrupt both).
#[derive(Debug, Clone)]
pub struct BamReassembler {
    responder_sa: u8,
    target_pgn: u32,
    strict_sequence: bool,
    state: State,
}

impl BamReassembler {
    /// New reassembler expecting a BAM transfer of `target_pgn` from the
    /// responder at `responder_sa`.
    pub fn new(responder_sa: u8, target_pgn: u32) -> Self {
        Self {
            responder_sa,
            target_pgn,
            strict_sequence: false,
            state: State::Idle,
        }
    }

    /// Enable strict sequence checking: a data packet whose sequence number
    /// is not the next expected one aborts the accumulation back to idle.
    ///
    /// Off by default — the permissive mode appends chunks as received,
    /// which tolerates (and silently mis-assembles) reordered traffic.
    pub fn with_strict_sequence(mut self, strict: bool) -> Self {
        self.strict_sequence = strict;
        self
    }

    /// Feed one decoded frame into the state machine.
    ///
    /// Returns `Some(vin)` on the transition to complete, `None` otherwise.
    /// Frames with a non-matching PGN or source address are ignored in every
    /// state. A matching control packet always starts a fresh accumulation,
    /// discarding any partial state.
    pub fn handle_frame(&mut self, frame: &BusFrame) -> Option<String> {
        if frame.source_address() != self.responder_sa {
            tracing::trace!(
                id = format_args!("{:08X}", frame.id),
                "Ignoring frame from unexpected source"
            );
            return None;
        }

        match frame.pgn() {
            PGN_TP_CM => {
                self.handle_control(frame);
                None
            }
            PGN_TP_DT => self.handle_data(frame),
            _ => None,
        }
    }

    fn handle_control(&mut self, frame: &BusFrame) {
        let data = &frame.data;
        if data[0] != TP_CM_BAM {
            return;
        }
        let announced_pgn =
            u32::from(data[5]) | (u32::from(data[6]) << 8) | (u32::from(data[7]) << 16);
        if announced_pgn != self.target_pgn {
            tracing::trace!(
                announced = format_args!("{:05X}", announced_pgn),
                expected = format_args!("{:05X}", self.target_pgn),
                "Ignoring BAM announcement for a different parameter group"
            );
            return;
        }

        let total_length = usize::from(data[1]);
        let expected_packets = data[2];
        tracing::debug!(
            total_length,
            expected_packets,
            "BAM transfer announced, starting collection"
        );
        // A new announcement supersedes any partial accumulation.
        self.state = State::Collecting {
            total_length,
            expected_packets,
            received: 0,
            buf: Vec::with_capacity(total_length),
        };
    }

    fn handle_data(&mut self, frame: &BusFrame) -> Option<String> {
        let State::Collecting {
            total_length,
            expected_packets,
            received,
            buf,
        } = &mut self.state
        else {
            // Data packets outside a transfer carry no meaning here.
            return None;
        };

        let sequence = frame.data[0];
        if self.strict_sequence && sequence != *received + 1 {
            tracing::warn!(
                sequence,
                expected = *received + 1,
                "Out-of-sequence data packet, aborting accumulation"
            );
            self.state = State::Idle;
            return None;
        }

        buf.extend_from_slice(&frame.data[1..=CHUNK_LEN]);
        *received += 1;
        tracing::trace!(
            sequence,
            received = *received,
            expected_packets = *expected_packets,
            collected = buf.len(),
            "Data packet appended"
        );

        if buf.len() >= *total_length {
            let vin = decode_vin(buf, *total_length);
            tracing::debug!(vin = %vin, packets = *received, "BAM transfer complete");
            self.state = State::Complete(vin.clone());
            return Some(vin);
        }
        None
    }

    /// Whether the transfer has reached the complete state.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete(_))
    }

    /// The reassembled value, once complete.
    pub fn vin(&self) -> Option<&str> {
        match &self.state {
            State::Complete(vin) => Some(vin),
            _ => None,
        }
    }
}

/// Decode the first `min(total_length, VIN_LENGTH)` accumulated bytes as
/// ASCII. Non-ASCII bytes are dropped rather than failing — the value came
/// off an untrusted bus and a mangled VIN is still worth surfacing.
fn decode_vin(buf: &[u8], total_length: usize) -> String {
    buf.iter()
        .take(total_length.min(VIN_LENGTH))
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}
