//! Observability infrastructure.
//!
//! Provides:
//! - Structured logging via tracing-subscriber
//! - OpenTelemetry metrics for batch writes and transactions

pub mod metrics;
pub mod tracing;
