//! vela-core
//!
//! Core types and utilities shared across the vela candle engine.
//!
//! - `types`: the canonical [`Trade`] record and the [`Candle`] wire format.
//! - `error`: the unified [`VelaError`] used by connectors, engine, and egress.
//! - `stream`: [`SessionHandle`] for long-lived ingest session tasks.
//! - `coerce`: lenient JSON scalar coercion for vendor payloads.
//! - `iso4217`: compact currency allow list and FX pair splitting.
#![warn(missing_docs)]

/// Lenient coercion of dynamically typed vendor scalars.
pub mod coerce;
/// Core error type shared by the engine and connectors.
pub mod error;
/// ISO 4217 allow list and FX symbol helpers.
pub mod iso4217;
/// Session handle utilities for long-lived ingest tasks.
pub mod stream;
pub mod types;

pub use error::VelaError;
pub use stream::SessionHandle;
pub use types::{AGGREGATE_SOURCE, BackoffConfig, Candle, Trade, normalize_symbol};
