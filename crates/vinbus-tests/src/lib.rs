//! Integration tests for the vinbus stack
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - Request/response session protocol over TCP
//! - VIN retrieval backend driving the BAM reassembler
//! - Intercept proxy tampering responses in transit
//!
//! The bus side runs against the mock responder ECU, so no CAN interface
//! is required. Tests binding fixed ports are marked `#[serial]`; the rest
//! use ephemeral ports and run in parallel.
//!
//! ```bash
//! cargo test -p vinbus-tests
//! ```

// This crate only contains tests, no library code
