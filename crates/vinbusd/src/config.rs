//! Daemon configuration (TOML)
//!
//! ```toml
//! [topology]
//! intercept = true
//! client_addr = "127.0.0.1:1337"
//! backend_addr = "127.0.0.1:1555"
//!
//! [bus]
//! type = "mock"
//! vin = "1HGCM82633A123456"
//!
//! [retrieval]
//! retrieval_timeout_ms = 5000
//! strict_sequence = false
//! ```

use serde::Deserialize;
use vinbus_backend::{BusConfig, ServiceConfig};

/// Top-level daemon configuration
#[derive(Debug, Default, Deserialize)]
pub struct DaemonConfig {
    /// Endpoint topology (interception on/off, addresses)
    #[serde(default)]
    pub topology: TopologyConfig,
    /// Bus channel selection
    #[serde(default)]
    pub bus: BusConfig,
    /// Retrieval service settings
    #[serde(default)]
    pub retrieval: ServiceConfig,
}

/// Which endpoint each component binds.
///
/// The client-facing endpoint is exclusive: either the backend binds it
/// directly (`intercept = false`) or the proxy does and forwards to the
/// backend endpoint (`intercept = true`). A static topology decision, not
/// a runtime race.
#[derive(Debug, Deserialize)]
pub struct TopologyConfig {
    /// Whether the intercept proxy occupies the client-facing endpoint
    #[serde(default = "default_intercept")]
    pub intercept: bool,
    /// Client-facing endpoint
    #[serde(default = "default_client_addr")]
    pub client_addr: String,
    /// Backend endpoint (only bound when interception is active)
    #[serde(default = "default_backend_addr")]
    pub backend_addr: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            intercept: default_intercept(),
            client_addr: default_client_addr(),
            backend_addr: default_backend_addr(),
        }
    }
}

fn default_intercept() -> bool {
    true
}

fn default_client_addr() -> String {
    "127.0.0.1:1337".to_string()
}

fn default_backend_addr() -> String {
    "127.0.0.1:1555".to_string()
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_interception() {
        let config = DaemonConfig::default();
        assert!(config.topology.intercept);
        assert_eq!(config.topology.client_addr, "127.0.0.1:1337");
        assert_eq!(config.topology.backend_addr, "127.0.0.1:1555");
    }

    #[test]
    fn parses_minimal_toml() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [topology]
            intercept = false

            [bus]
            type = "mock"
            vin = "WVWZZZ1JZXW000001"
            "#,
        )
        .unwrap();
        assert!(!config.topology.intercept);
        match config.bus {
            BusConfig::Mock(ref mock) => assert_eq!(mock.vin, "WVWZZZ1JZXW000001"),
            _ => panic!("expected mock bus config"),
        }
        assert_eq!(config.retrieval.retrieval_timeout_ms, 5000);
    }

    #[test]
    fn parses_socketcan_bus() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [bus]
            type = "socketcan"
            interface = "vcan0"
            "#,
        )
        .unwrap();
        match config.bus {
            BusConfig::SocketCan(ref cfg) => assert_eq!(cfg.interface, "vcan0"),
            _ => panic!("expected socketcan bus config"),
        }
    }
}
