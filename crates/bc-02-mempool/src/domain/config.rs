use serde::{Deserialize, Serialize};

/// Mempool tracker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Maximum summaries sent to one new connection during catch-up.
    pub catch_up_limit: usize,
    /// Concurrent detail lookups during catch-up.
    pub lookup_concurrency: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            catch_up_limit: 500,
            lookup_concurrency: 8,
        }
    }
}
