//! # Restart Behaviour
//!
//! The JSON mirror lets a restarted process serve its cached window
//! without asking the node for history again.

#[cfg(test)]
mod tests {
    use crate::integration::{config_in, TestNode};
    use bc_01_chain_cache::InitOutcome;
    use bc_03_feed::MockFeed;
    use node_runtime::BlockclockRuntime;
    use shared_types::fixtures::header;
    use shared_types::ChainSnapshot;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restart_restores_mirror_without_backfill() {
        let dir = TempDir::new().unwrap();

        let mut first = TestNode::start(
            Arc::new(MockFeed::with_chain(0..=30)),
            config_in(dir.path()),
        )
        .await;
        first.feed.mine(31);
        let before = first.wait_for_tip(31).await;
        first.stop().await.unwrap();

        // The second node knows nothing beyond its tip.
        let feed = Arc::new(MockFeed::with_chain(31..=31));
        let runtime = BlockclockRuntime::initialize(config_in(dir.path()), feed.clone())
            .await
            .unwrap();

        assert_eq!(
            runtime.init_outcome(),
            &InitOutcome::Loaded {
                blocks: 20,
                trimmed: 0
            }
        );
        assert_eq!(feed.header_fetches(), 0);
        assert_eq!(runtime.snapshots().borrow().as_ref(), before.as_ref());
    }

    #[tokio::test]
    async fn test_corrupt_mirror_refuses_to_start() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.cache.mirror_path, "{ not json").unwrap();

        let err = BlockclockRuntime::initialize(config, Arc::new(MockFeed::with_chain(0..=30)))
            .await
            .err()
            .expect("corrupt mirror is fatal");

        assert!(format!("{err:#}").contains("corrupt"));
    }

    #[tokio::test]
    async fn test_reset_discards_corrupt_mirror() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(dir.path());
        config.cache.reset = true;
        std::fs::write(&config.cache.mirror_path, "{ not json").unwrap();
        let mirror = config.cache.mirror_path.clone();

        let runtime = BlockclockRuntime::initialize(config, Arc::new(MockFeed::with_chain(0..=30)))
            .await
            .unwrap();

        assert_eq!(
            runtime.init_outcome(),
            &InitOutcome::Backfilled { from: 11, to: 30 }
        );
        let stored: ChainSnapshot =
            serde_json::from_str(&std::fs::read_to_string(mirror).unwrap()).unwrap();
        assert_eq!(stored.len(), 20);
    }

    #[tokio::test]
    async fn test_oversized_mirror_is_trimmed_on_load() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let oversized: ChainSnapshot = (0..=29).map(header).collect();
        std::fs::write(
            &config.cache.mirror_path,
            serde_json::to_string(&oversized).unwrap(),
        )
        .unwrap();

        let runtime = BlockclockRuntime::initialize(config, Arc::new(MockFeed::with_chain(0..=29)))
            .await
            .unwrap();

        assert_eq!(
            runtime.init_outcome(),
            &InitOutcome::Loaded {
                blocks: 20,
                trimmed: 10
            }
        );
        let snapshot = runtime.snapshots().borrow().clone();
        assert!(snapshot.get(9).is_none());
        assert_eq!(snapshot.tip().unwrap().height, 29);
    }

    #[tokio::test]
    async fn test_short_chain_backfills_from_genesis() {
        let dir = TempDir::new().unwrap();

        let runtime = BlockclockRuntime::initialize(
            config_in(dir.path()),
            Arc::new(MockFeed::with_chain(0..=4)),
        )
        .await
        .unwrap();

        assert_eq!(
            runtime.init_outcome(),
            &InitOutcome::Backfilled { from: 0, to: 4 }
        );
        assert_eq!(runtime.snapshots().borrow().len(), 5);
    }
}
