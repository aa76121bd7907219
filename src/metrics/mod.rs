//! Metrics and tracing support.
//!
//! With the `metrics` feature, OpenTelemetry instruments are exported into a dedicated
//! Prometheus registry; [`render_prometheus`] produces the text exposition format.
//! With the `tracing` feature, [`tracing_helpers`] provides the spans used throughout the crate.

#[cfg(feature = "tracing")]
pub mod tracing_helpers;

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider as _},
    KeyValue,
};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics::SdkMeterProvider;
#[cfg(feature = "metrics")]
use std::time::Duration;

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<ErpMetrics> = Lazy::new(ErpMetrics::init);

#[cfg(feature = "metrics")]
pub struct ErpMetrics {
    registry: prometheus::Registry,
    _provider: Option<SdkMeterProvider>,
    queries_total: Counter<u64>,
    query_errors_total: Counter<u64>,
    query_duration: Histogram<f64>,
    entries_posted: Counter<u64>,
    ledger_rows_written: Counter<u64>,
    orders_reconciled: Counter<u64>,
    device_sync_duration: Histogram<f64>,
    device_sync_failures: Counter<u64>,
    salaries_generated: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl ErpMetrics {
    fn init() -> Self {
        let registry = prometheus::Registry::new();
        let provider = match opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
        {
            Ok(exporter) => Some(SdkMeterProvider::builder().with_reader(exporter).build()),
            Err(e) => {
                log::warn!("prometheus exporter unavailable, metrics stay in-process: {e}");
                None
            }
        };
        let meter = match &provider {
            Some(provider) => provider.meter("ledgerguard"),
            None => global::meter("ledgerguard"),
        };

        Self {
            queries_total: meter
                .u64_counter("ledgerguard_queries_total")
                .with_description("Total statements executed")
                .build(),
            query_errors_total: meter
                .u64_counter("ledgerguard_query_errors_total")
                .with_description("Statements that returned an error")
                .build(),
            query_duration: meter
                .f64_histogram("ledgerguard_query_duration_seconds")
                .with_description("Duration of statements")
                .build(),
            entries_posted: meter
                .u64_counter("ledgerguard_entries_posted_total")
                .with_description("Journal entry postings by outcome")
                .build(),
            ledger_rows_written: meter
                .u64_counter("ledgerguard_ledger_rows_written_total")
                .with_description("General ledger rows written by posting")
                .build(),
            orders_reconciled: meter
                .u64_counter("ledgerguard_orders_reconciled_total")
                .with_description("Sales order payment recomputations by resulting status")
                .build(),
            device_sync_duration: meter
                .f64_histogram("ledgerguard_device_sync_duration_seconds")
                .with_description("Wall time of one attendance device fetch")
                .build(),
            device_sync_failures: meter
                .u64_counter("ledgerguard_device_sync_failures_total")
                .with_description("Attendance device fetches that failed")
                .build(),
            salaries_generated: meter
                .u64_counter("ledgerguard_salaries_generated_total")
                .with_description("Employee salary rows generated by payroll runs")
                .build(),
            registry,
            _provider: provider,
        }
    }

    pub fn record_query_duration(&self, elapsed: Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.add(1, &[]);
    }

    pub fn record_posting(&self, outcome: &'static str, rows: usize) {
        self.entries_posted
            .add(1, &[KeyValue::new("outcome", outcome)]);
        if rows > 0 {
            self.ledger_rows_written.add(rows as u64, &[]);
        }
    }

    pub fn record_reconciliation(&self, status: &'static str) {
        self.orders_reconciled
            .add(1, &[KeyValue::new("status", status)]);
    }

    pub fn record_device_sync(&self, elapsed: Duration, failed: bool) {
        self.device_sync_duration.record(elapsed.as_secs_f64(), &[]);
        if failed {
            self.device_sync_failures.add(1, &[]);
        }
    }

    pub fn record_salaries_generated(&self, count: usize) {
        self.salaries_generated.add(count as u64, &[]);
    }

    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }
}

/// Prometheus text exposition of every ledgerguard instrument
#[cfg(feature = "metrics")]
pub fn render_prometheus() -> Result<String, prometheus::Error> {
    let encoder = prometheus::TextEncoder::new();
    encoder.encode_to_string(&METRICS.registry().gather())
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_do_not_panic_and_render() {
        METRICS.record_query_duration(Duration::from_millis(3));
        METRICS.record_query_error();
        METRICS.record_posting("posted", 4);
        METRICS.record_reconciliation("Invoiced");
        METRICS.record_device_sync(Duration::from_millis(20), true);
        METRICS.record_salaries_generated(2);
        assert!(render_prometheus().is_ok());
    }
}
