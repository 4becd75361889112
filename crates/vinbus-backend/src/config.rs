//! Backend configuration
//!
//! All knobs are explicit, immutable values handed over at construction
//! time; nothing is read from process-wide mutable state.

use serde::{Deserialize, Serialize};

/// Bus channel selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    /// Simulated responder ECU for tests and demos
    Mock(MockBusConfig),
    /// SocketCAN interface (Linux only, feature `socketcan`)
    SocketCan(SocketCanBusConfig),
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::Mock(MockBusConfig::default())
    }
}

/// Simulated responder ECU configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockBusConfig {
    /// VIN the simulated ECU announces over BAM
    #[serde(default = "default_vin")]
    pub vin: String,
    /// Source address the simulated ECU transmits from
    #[serde(default)]
    pub responder_sa: u8,
}

impl Default for MockBusConfig {
    fn default() -> Self {
        Self {
            vin: default_vin(),
            responder_sa: 0x00,
        }
    }
}

fn default_vin() -> String {
    "1HGCM82633A123456".to_string()
}

/// SocketCAN channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketCanBusConfig {
    /// CAN interface name (e.g., "vcan0")
    pub interface: String,
}

/// VIN retrieval service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Source address the service requests from
    #[serde(default = "default_requester_sa")]
    pub requester_sa: u8,
    /// Source address of the ECU expected to answer
    #[serde(default)]
    pub responder_sa: u8,
    /// Deadline for one retrieval (request sent until BAM complete)
    #[serde(default = "default_retrieval_timeout_ms")]
    pub retrieval_timeout_ms: u64,
    /// Reject out-of-sequence data packets instead of appending as received
    #[serde(default)]
    pub strict_sequence: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            requester_sa: default_requester_sa(),
            responder_sa: 0x00,
            retrieval_timeout_ms: default_retrieval_timeout_ms(),
            strict_sequence: false,
        }
    }
}

fn default_requester_sa() -> u8 {
    0xFA
}

fn default_retrieval_timeout_ms() -> u64 {
    5000
}
