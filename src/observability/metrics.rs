//! OpenTelemetry metrics.
//!
//! Key metrics:
//! - modelflow_batch_entities_total: Entities written successfully by batch savers
//! - modelflow_batch_latency_seconds: Histogram of batch call duration
//! - modelflow_transaction_total: Async transactions by outcome
//! - modelflow_transaction_latency_seconds: Histogram of transaction run time

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// modelflow metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Entities whose batch operation succeeded.
    pub batch_entities_total: Counter<u64>,
    /// Histogram of batch call duration in seconds.
    pub batch_latency: Histogram<f64>,
    /// Async transactions by outcome.
    pub transaction_total: Counter<u64>,
    /// Histogram of transaction run time in seconds.
    pub transaction_latency: Histogram<f64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            batch_entities_total: meter
                .u64_counter("modelflow_batch_entities_total")
                .with_description("Entities written successfully by batch savers")
                .with_unit("1")
                .init(),
            batch_latency: meter
                .f64_histogram("modelflow_batch_latency_seconds")
                .with_description("Batch save call duration")
                .with_unit("s")
                .init(),
            transaction_total: meter
                .u64_counter("modelflow_transaction_total")
                .with_description("Async transactions by outcome")
                .with_unit("1")
                .init(),
            transaction_latency: meter
                .f64_histogram("modelflow_transaction_latency_seconds")
                .with_description("Async transaction run time")
                .with_unit("s")
                .init(),
        }
    }
}

/// Initialize the metrics system.
///
/// Metrics are recorded into a manual reader and are not exported. This
/// should be called once at startup; subsequent calls are ignored. Until it
/// is called, recording functions are no-ops.
pub fn init_metrics() {
    METRICS.get_or_init(|| {
        let reader = ManualReader::builder().build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        global::set_meter_provider(provider);

        let meter = global::meter("modelflow");
        Metrics::new(&meter)
    });
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record a finished batch call.
pub fn record_batch(table: &str, operation: &str, succeeded: u64, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        let attrs = [
            KeyValue::new("table", table.to_string()),
            KeyValue::new("operation", operation.to_string()),
        ];
        m.batch_entities_total.add(succeeded, &attrs);
        m.batch_latency.record(latency_seconds, &attrs);
    }
}

/// Record a finished or rejected async transaction.
pub fn record_transaction(outcome: &'static str, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        let attrs = [KeyValue::new("outcome", outcome)];
        m.transaction_total.add(1, &attrs);
        m.transaction_latency.record(latency_seconds, &attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(metrics().is_some());
    }

    #[test]
    fn test_record_batch() {
        init_metrics();
        // Should not panic
        record_batch("notes", "insert", 3, 0.002);
    }

    #[test]
    fn test_record_transaction() {
        init_metrics();
        // Should not panic
        record_transaction("completed", 0.001);
        record_transaction("rejected", 0.0);
    }
}
