//! Logging setup for binaries and tests embedding the crate.

pub mod tracing;

pub use self::tracing::{init_tracing, TelemetryConfig};
