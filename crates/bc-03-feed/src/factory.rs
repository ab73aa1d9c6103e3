//! Backend selection.

use crate::adapters::{BitcoindFeed, WsPushFeed};
use crate::domain::{FeedBackend, FeedConfig, FeedError};
use crate::ports::FeedAdapter;
use shared_types::Network;
use std::sync::Arc;
use tracing::info;

/// Build the backend named by `config.backend`.
///
/// The push backend connects here; the bitcoind backend connects lazily on
/// its first call or subscription.
pub async fn connect_feed(
    config: &FeedConfig,
    network: Network,
) -> Result<Arc<dyn FeedAdapter>, FeedError> {
    config.validate()?;
    let feed: Arc<dyn FeedAdapter> = match config.backend {
        FeedBackend::Bitcoind => Arc::new(BitcoindFeed::new(config, network)?),
        FeedBackend::Push => Arc::new(WsPushFeed::connect(config, network).await?),
    };
    info!(backend = feed.name(), network = %network, "Feed ready");
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_config_rejected_before_connecting() {
        let config = FeedConfig {
            backend: FeedBackend::Push,
            push_url: String::new(),
            ..FeedConfig::default()
        };
        assert!(matches!(
            connect_feed(&config, Network::Bitcoin).await,
            Err(FeedError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_bitcoind_backend_selected() {
        let feed = connect_feed(&FeedConfig::regtest(), Network::Regtest)
            .await
            .unwrap();
        assert_eq!(feed.name(), "bitcoind");
        assert_eq!(feed.network(), Network::Regtest);
    }
}
