//! VIN request frame builder

use crate::frame::BusFrame;

/// PGN of the parameter-group request message (PGN 59904, "Request").
pub const PGN_REQUEST: u32 = 0xEA00;

/// Destination address placed in the low byte of the request PGN field.
pub const REQUEST_DA: u8 = 0xF9;

/// PGN of the Vehicle Identification parameter group (PGN 65260).
pub const PGN_VIN: u32 = 0xFEEC;

/// Build the frame that asks the bus for the VIN parameter group.
///
/// The arbitration id carries the request PGN with [`REQUEST_DA`] in its low
/// byte and the requester's own source address in bits 0-7. The 3-byte
/// payload is the little-endian encoding of [`PGN_VIN`].
///
/// Pure construction, no side effects.
pub fn vin_request(requester_sa: u8) -> BusFrame {
    let id = ((PGN_REQUEST | u32::from(REQUEST_DA)) << 8) | u32::from(requester_sa);
    let mut data = [0u8; 8];
    data[0] = (PGN_VIN & 0xFF) as u8;
    data[1] = ((PGN_VIN >> 8) & 0xFF) as u8;
    data[2] = ((PGN_VIN >> 16) & 0xFF) as u8;
    BusFrame { id, len: 3, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_layout() {
        let frame = vin_request(0xFA);
        assert_eq!(frame.id, 0x00EAF9FA);
        assert_eq!(frame.pgn(), 0xEAF9);
        assert_eq!(frame.source_address(), 0xFA);
        assert_eq!(frame.len, 3);
        assert_eq!(frame.payload(), &[0xEC, 0xFE, 0x00]);
    }

    #[test]
    fn request_payload_is_zero_padded() {
        let frame = vin_request(0x00);
        assert_eq!(&frame.data[3..], &[0, 0, 0, 0, 0]);
    }
}
