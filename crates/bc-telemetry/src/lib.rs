//! # Blockclock Telemetry
//!
//! Structured logging and Prometheus metrics shared by every block clock
//! crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, overrides everything |
//! | `BC_LOG_LEVEL` | `info` | Log level filter |
//! | `BC_JSON_LOGS` | `false` | One JSON object per log line |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, BLOCKS_ADDED, BROADCAST_FAILURES, CACHE_SIZE, CHAIN_TIP,
    FEED_NOTIFICATIONS, FRAMES_SENT, MEMPOOL_SIZE, MIRROR_WRITE_DURATION, SUBSCRIBERS_CONNECTED,
    TRANSACTIONS_SEEN, TX_LOOKUP_FAILURES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first, so anything logged during init can be counted
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
