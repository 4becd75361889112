//! vinbus-proxy - Transparent VIN interception
//!
//! Sits on the client-facing endpoint in place of the backend, speaks the
//! same session protocol, forwards matching requests to the real backend
//! and returns a deterministically tampered VIN — never the original.
//!
//! Demonstrates how an interposed relay can preserve protocol semantics
//! while altering payload content in transit.

mod error;
mod proxy;
mod tamper;

pub use error::ProxyError;
pub use proxy::InterceptProxy;
pub use tamper::{tamper_vin, TAMPER_MARKER};
