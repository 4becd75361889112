//! Fixed-layout bus frame codec
//!
//! The wire format is a fixed 16-byte record:
//!
//! | bytes | field                                              |
//! |-------|----------------------------------------------------|
//! | 0-3   | little-endian arbitration id, EFF flag in high bit |
//! | 4     | payload length (0-8)                               |
//! | 5-7   | reserved, zero on encode, ignored on decode        |
//! | 8-15  | payload, zero-padded beyond `len`                  |
//!
//! Semantic validation (PGN, source address) is the reassembler's job;
//! the codec only enforces the record shape.

use crate::error::ProtoError;

/// Extended-format flag: marks a 29-bit arbitration id on the wire.
pub const EFF_FLAG: u32 = 0x8000_0000;

/// 29-bit arbitration id mask.
pub const ID_MASK: u32 = 0x1FFF_FFFF;

/// Size of one frame record on the wire.
pub const WIRE_FRAME_LEN: usize = 16;

/// A single bus frame: 29-bit arbitration id, length and an 8-byte payload.
///
/// Payload bytes beyond `len` are ignorable padding and are always zero
/// after [`BusFrame::new`] or [`BusFrame::from_wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFrame {
    /// 29-bit arbitration id (priority, PGN, source address).
    pub id: u32,
    /// Number of meaningful payload bytes (0-8).
    pub len: u8,
    /// Payload, zero-padded to 8 bytes.
    pub data: [u8; 8],
}

impl BusFrame {
    /// Build a frame from an arbitration id and a payload of up to 8 bytes.
    ///
    /// Fails with [`ProtoError::InvalidPayload`] when the payload is longer
    /// than 8 bytes. The payload is zero-padded to the full 8 bytes.
    pub fn new(id: u32, payload: &[u8]) -> Result<Self, ProtoError> {
        if payload.len() > 8 {
            return Err(ProtoError::InvalidPayload(payload.len()));
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id: id & ID_MASK,
            len: payload.len() as u8,
            data,
        })
    }

    /// Parameter Group Number: bits 8-23 of the arbitration id.
    pub fn pgn(&self) -> u32 {
        (self.id >> 8) & 0xFFFF
    }

    /// Source address: bits 0-7 of the arbitration id.
    pub fn source_address(&self) -> u8 {
        (self.id & 0xFF) as u8
    }

    /// The meaningful payload bytes (first `len` bytes).
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len.min(8))]
    }

    /// Encode to the fixed 16-byte wire record, EFF flag set.
    pub fn to_wire(&self) -> [u8; WIRE_FRAME_LEN] {
        let mut raw = [0u8; WIRE_FRAME_LEN];
        raw[0..4].copy_from_slice(&((self.id & ID_MASK) | EFF_FLAG).to_le_bytes());
        raw[4] = self.len;
        // bytes 5-7 stay zero (reserved)
        raw[8..16].copy_from_slice(&self.data);
        raw
    }

    /// Decode a fixed 16-byte wire record.
    ///
    /// Fails with [`ProtoError::MalformedFrame`] when the record is not
    /// exactly 16 bytes. Reserved bytes are ignored, the EFF flag is
    /// stripped, and payload bytes beyond `len` are cleared so decoded
    /// frames compare equal to their encoded source.
    pub fn from_wire(raw: &[u8]) -> Result<Self, ProtoError> {
        if raw.len() != WIRE_FRAME_LEN {
            return Err(ProtoError::MalformedFrame(raw.len()));
        }
        let id = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) & ID_MASK;
        let len = raw[4].min(8);
        let mut data = [0u8; 8];
        data.copy_from_slice(&raw[8..16]);
        // Padding beyond `len` is ignorable; normalise it to zero.
        for byte in data.iter_mut().skip(usize::from(len)) {
            *byte = 0;
        }
        Ok(Self { id, len, data })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trip_preserves_frame() {
        let frame = BusFrame::new(0x18FEEC00, b"ABCDE").unwrap();
        let decoded = BusFrame::from_wire(&frame.to_wire()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn round_trip_full_payload() {
        let frame = BusFrame::new(0x18EBFF00, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let decoded = BusFrame::from_wire(&frame.to_wire()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn encode_sets_eff_flag_and_pads() {
        let frame = BusFrame::new(0x00EAF9FA, &[0xEC, 0xFE, 0x00]).unwrap();
        let raw = frame.to_wire();
        let id = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        assert_eq!(id & EFF_FLAG, EFF_FLAG);
        assert_eq!(raw[4], 3);
        assert_eq!(&raw[5..8], &[0, 0, 0]);
        assert_eq!(&raw[11..16], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn payload_too_long_rejected() {
        let err = BusFrame::new(0x100, &[0u8; 9]).unwrap_err();
        assert_eq!(err, ProtoError::InvalidPayload(9));
    }

    #[test]
    fn wrong_record_size_rejected() {
        assert_eq!(
            BusFrame::from_wire(&[0u8; 15]),
            Err(ProtoError::MalformedFrame(15))
        );
        assert_eq!(
            BusFrame::from_wire(&[0u8; 17]),
            Err(ProtoError::MalformedFrame(17))
        );
    }

    #[test]
    fn decode_clears_padding_past_len() {
        let mut raw = [0xFFu8; WIRE_FRAME_LEN];
        raw[0..4].copy_from_slice(&(0x18ECFF00u32 | EFF_FLAG).to_le_bytes());
        raw[4] = 2;
        let frame = BusFrame::from_wire(&raw).unwrap();
        assert_eq!(frame.payload(), &[0xFF, 0xFF]);
        assert_eq!(&frame.data[2..], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn pgn_and_source_extraction() {
        let frame = BusFrame::new(0x18ECFF2A, &[]).unwrap();
        assert_eq!(frame.pgn(), 0xECFF);
        assert_eq!(frame.source_address(), 0x2A);
    }
}
