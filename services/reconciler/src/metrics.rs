// Prometheus metrics for the reconciliation loop

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, Encoder, Histogram, HistogramOpts, IntCounter,
    TextEncoder,
};

lazy_static! {
    pub static ref PASSES_TOTAL: IntCounter = register_int_counter!(
        "reconciler_passes_total",
        "Reconciliation passes started"
    )
    .expect("metric can be created");

    pub static ref PASSES_SKIPPED: IntCounter = register_int_counter!(
        "reconciler_passes_skipped_total",
        "Timer ticks skipped because the previous pass was still running"
    )
    .expect("metric can be created");

    pub static ref RECORDS_EXPIRED: IntCounter = register_int_counter!(
        "reconciler_records_expired_total",
        "Pending records canceled by the expiry sweep"
    )
    .expect("metric can be created");

    pub static ref RECORDS_MATCHED: IntCounter = register_int_counter!(
        "reconciler_records_matched_total",
        "Pending records settled against a mutation entry"
    )
    .expect("metric can be created");

    pub static ref FEED_FAILURES: IntCounter = register_int_counter!(
        "reconciler_feed_failures_total",
        "Mutation feed fetches that returned no usable data"
    )
    .expect("metric can be created");

    pub static ref PASS_DURATION: Histogram = register_histogram!(HistogramOpts::new(
        "reconciler_pass_duration_seconds",
        "Duration of one reconciliation pass in seconds"
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]))
    .expect("metric can be created");
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handler() {
        PASSES_TOTAL.inc();
        let output = metrics_handler().unwrap();
        assert!(output.contains("reconciler_passes_total"));
    }
}
