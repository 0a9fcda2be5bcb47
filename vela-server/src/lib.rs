//! vela-server
//!
//! The deployable face of the vela engine: CLI parsing, the WebSocket
//! streaming endpoint, and optional Kafka egress. Exposed as a library so
//! the pieces are integration-testable; `main` just wires them together.

/// CLI flags and duration parsing.
pub mod config;
#[cfg(feature = "kafka")]
/// Kafka candle publisher.
pub mod publish;
/// WebSocket subscription endpoint.
pub mod server;
