//! vinbus-proto - Protocol layer for the vinbus field-bus stack
//!
//! This crate provides the pure protocol building blocks that the backend
//! service and intercept proxy are built on:
//! - Fixed-layout bus frame encode/decode ([`BusFrame`])
//! - The VIN request frame builder ([`vin_request`])
//! - The BAM multi-frame reassembly state machine ([`BamReassembler`])
//!
//! Nothing here performs I/O; frames come in and out as byte records so the
//! transport (SocketCAN, mock ECU, ...) stays a separate concern.

pub mod bam;
pub mod error;
pub mod frame;
pub mod request;

pub use bam::{BamReassembler, PGN_TP_CM, PGN_TP_DT, TP_CM_BAM, VIN_LENGTH};
pub use error::ProtoError;
pub use frame::{BusFrame, EFF_FLAG, ID_MASK, WIRE_FRAME_LEN};
pub use request::{vin_request, PGN_REQUEST, PGN_VIN, REQUEST_DA};
