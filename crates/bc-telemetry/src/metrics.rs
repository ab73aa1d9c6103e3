//! Prometheus metrics for the block clock server.
//!
//! All metrics follow the naming convention: `blockclock_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHAIN CACHE
    // =========================================================================

    /// Blocks added to the cache through live notifications
    pub static ref BLOCKS_ADDED: Counter = Counter::new(
        "blockclock_cache_blocks_added_total",
        "Total number of blocks added to the chain cache"
    ).expect("metric creation failed");

    /// Current number of cached headers
    pub static ref CACHE_SIZE: Gauge = Gauge::new(
        "blockclock_cache_size",
        "Number of headers currently held by the chain cache"
    ).expect("metric creation failed");

    /// Highest cached height
    pub static ref CHAIN_TIP: Gauge = Gauge::new(
        "blockclock_cache_tip_height",
        "Height of the highest cached block"
    ).expect("metric creation failed");

    /// Mirror file rewrite duration
    pub static ref MIRROR_WRITE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "blockclock_cache_mirror_write_duration_seconds",
            "Time spent rewriting the mirror file"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // MEMPOOL
    // =========================================================================

    /// Transactions summarized and tracked
    pub static ref TRANSACTIONS_SEEN: Counter = Counter::new(
        "blockclock_mempool_transactions_seen_total",
        "Total transactions added to the mempool tracker"
    ).expect("metric creation failed");

    /// Current tracked transaction count
    pub static ref MEMPOOL_SIZE: Gauge = Gauge::new(
        "blockclock_mempool_transactions_pending",
        "Transactions tracked since the last block"
    ).expect("metric creation failed");

    /// Failed transaction detail lookups
    pub static ref TX_LOOKUP_FAILURES: CounterVec = CounterVec::new(
        Opts::new("blockclock_tx_lookup_failures_total", "Failed transaction lookups"),
        &["kind"]  // kind: not_found/unavailable/decode
    ).expect("metric creation failed");

    // =========================================================================
    // FEED
    // =========================================================================

    /// Notifications received from the node
    pub static ref FEED_NOTIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("blockclock_feed_notifications_total", "Notifications received from the node"),
        &["stream"]  // stream: block/tx
    ).expect("metric creation failed");

    // =========================================================================
    // BROADCAST
    // =========================================================================

    /// Connected push subscribers
    pub static ref SUBSCRIBERS_CONNECTED: Gauge = Gauge::new(
        "blockclock_broadcast_subscribers",
        "Number of currently connected push subscribers"
    ).expect("metric creation failed");

    /// Frames queued to subscribers
    pub static ref FRAMES_SENT: CounterVec = CounterVec::new(
        Opts::new("blockclock_broadcast_frames_sent_total", "Frames queued to subscribers"),
        &["event"]  // event: blocks/tx
    ).expect("metric creation failed");

    /// Frames that could not be queued to a subscriber
    pub static ref BROADCAST_FAILURES: CounterVec = CounterVec::new(
        Opts::new("blockclock_broadcast_failures_total", "Per-subscriber delivery failures"),
        &["reason"]  // reason: full/closed/backlog
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Chain cache
        Box::new(BLOCKS_ADDED.clone()),
        Box::new(CACHE_SIZE.clone()),
        Box::new(CHAIN_TIP.clone()),
        Box::new(MIRROR_WRITE_DURATION.clone()),
        // Mempool
        Box::new(TRANSACTIONS_SEEN.clone()),
        Box::new(MEMPOOL_SIZE.clone()),
        Box::new(TX_LOOKUP_FAILURES.clone()),
        // Feed
        Box::new(FEED_NOTIFICATIONS.clone()),
        // Broadcast
        Box::new(SUBSCRIBERS_CONNECTED.clone()),
        Box::new(FRAMES_SENT.clone()),
        Box::new(BROADCAST_FAILURES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    #[must_use]
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_counter_increment() {
        BLOCKS_ADDED.inc();
        assert!(BLOCKS_ADDED.get() >= 1.0);
    }

    #[test]
    fn test_labelled_counter() {
        TX_LOOKUP_FAILURES.with_label_values(&["not_found"]).inc();
        assert!(TX_LOOKUP_FAILURES.with_label_values(&["not_found"]).get() >= 1.0);
    }

    #[test]
    fn test_encode_contains_registered_metric() {
        register_metrics().unwrap();
        CACHE_SIZE.set(20.0);
        let text = encode_metrics().unwrap();
        assert!(text.contains("blockclock_cache_size"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = MIRROR_WRITE_DURATION.get_sample_count();
        drop(HistogramTimer::new(&MIRROR_WRITE_DURATION));
        assert!(MIRROR_WRITE_DURATION.get_sample_count() > before);
    }
}
