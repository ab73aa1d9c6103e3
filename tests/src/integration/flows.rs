//! # Event Flows
//!
//! Feed notices travel through the event pump, the chain cache and the mempool
//! tracker, then out over the bus to live subscribers:
//!
//! 1. **Block**: header fetched → cache updated → mirror written → mempool
//!    cleared → `blocks` frame
//! 2. **Transaction**: summary looked up → tracked → `tx` frame
//! 3. **Failures**: unknown blocks and transactions are skipped; a lost
//!    feed stops the process

#[cfg(test)]
mod tests {
    use crate::integration::{
        config_in, eventually, live_subscriber, next_frame, parse_event, TestNode,
    };
    use bc_03_feed::{BlockNotice, MockFeed, TxNotice};
    use shared_types::fixtures::{block_hash, header, tx_summary, txid};
    use shared_types::ChainSnapshot;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn node(chain: std::ops::RangeInclusive<u64>) -> (TempDir, TestNode) {
        let dir = TempDir::new().unwrap();
        let feed = Arc::new(MockFeed::with_chain(chain));
        let node = TestNode::start(feed, config_in(dir.path())).await;
        (dir, node)
    }

    // =========================================================================
    // BLOCK FLOW
    // =========================================================================

    #[tokio::test]
    async fn test_new_block_reaches_live_subscribers() {
        let (_dir, mut node) = node(0..=30).await;
        let (_id, mut frames) = live_subscriber(&node.registry);

        node.feed.mine(31);
        let snapshot = node.wait_for_tip(31).await;

        let (name, payload) = parse_event(&next_frame(&mut frames).await);
        assert_eq!(name, "blocks");
        let blocks = payload.as_object().unwrap();
        assert_eq!(blocks.len(), 20);
        assert!(blocks.contains_key("31"));
        assert!(!blocks.contains_key("11"));
        assert_eq!(snapshot.len(), 20);

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_mirror_follows_every_block() {
        let (_dir, mut node) = node(0..=30).await;

        node.feed.mine(31);
        node.feed.mine(32);
        let published = node.wait_for_tip(32).await;

        let stored: ChainSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&node.mirror).unwrap()).unwrap();
        assert_eq!(&stored, published.as_ref());
        assert_eq!(stored.len(), 20);

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_reorg_replaces_block_at_same_height() {
        let (_dir, node) = node(0..=30).await;
        let (_id, mut frames) = live_subscriber(&node.registry);

        let mut replacement = header(30);
        replacement.hash = block_hash(9_030);
        node.feed.add_header(replacement.clone());
        node.feed.announce_block(BlockNotice::Hash(replacement.hash));

        let (name, payload) = parse_event(&next_frame(&mut frames).await);
        assert_eq!(name, "blocks");
        assert_eq!(
            payload["30"]["hash"].as_str().unwrap(),
            replacement.hash.to_string()
        );

        let snapshot = node.snapshots.borrow().clone();
        assert_eq!(snapshot.len(), 20);
        assert_eq!(snapshot.tip().unwrap().hash, replacement.hash);

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_block_is_skipped() {
        let (_dir, mut node) = node(0..=30).await;

        node.feed.announce_block(BlockNotice::Hash(block_hash(777)));
        node.feed.mine(31);

        let snapshot = node.wait_for_tip(31).await;
        assert!(snapshot.get(777).is_none());

        node.stop().await.unwrap();
    }

    // =========================================================================
    // TRANSACTION FLOW
    // =========================================================================

    #[tokio::test]
    async fn test_new_transaction_reaches_live_subscribers() {
        let (_dir, node) = node(0..=30).await;
        let (_id, mut frames) = live_subscriber(&node.registry);

        let summary = tx_summary(11, 3);
        node.feed.add_transaction(summary.clone());
        node.feed.announce_tx(TxNotice::Id(summary.hash));

        let (name, payload) = parse_event(&next_frame(&mut frames).await);
        assert_eq!(name, "tx");
        assert_eq!(payload["hash"].as_str().unwrap(), summary.hash.to_string());
        assert_eq!(payload["outputs"].as_array().unwrap().len(), 3);
        assert_eq!(node.mempool.len(), 1);

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_broadcast() {
        let (_dir, node) = node(0..=30).await;
        let (_id, mut frames) = live_subscriber(&node.registry);

        node.feed.announce_tx(TxNotice::Id(txid(404)));
        let known = tx_summary(12, 1);
        node.feed.add_transaction(known.clone());
        node.feed.announce_tx(TxNotice::Id(known.hash));

        // Notices are handled in order, so the next frame is the known one.
        let (_, payload) = parse_event(&next_frame(&mut frames).await);
        assert_eq!(payload["hash"].as_str().unwrap(), known.hash.to_string());
        assert_eq!(node.mempool.len(), 1);

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_block_clears_tracked_mempool() {
        let (_dir, mut node) = node(0..=30).await;

        for seed in 1..=3 {
            let summary = tx_summary(seed, 1);
            node.feed.add_transaction(summary.clone());
            node.feed.announce_tx(TxNotice::Id(summary.hash));
        }
        let mempool = node.mempool.clone();
        assert!(eventually(|| mempool.len() == 3).await);

        node.feed.mine(31);
        node.wait_for_tip(31).await;
        assert!(eventually(|| mempool.is_empty()).await);

        node.stop().await.unwrap();
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_lost_feed_stops_the_process() {
        let (_dir, node) = node(0..=30).await;
        let registry = node.registry.clone();
        let (_id, _frames) = live_subscriber(&registry);

        node.feed.disconnect();

        let err = node.join().await.unwrap_err();
        assert!(format!("{err:#}").contains("stream closed"));
    }

    #[tokio::test]
    async fn test_node_outage_during_block_is_fatal() {
        let (_dir, node) = node(0..=30).await;

        node.feed.set_unavailable(true);
        node.feed.announce_block(BlockNotice::Height(31));

        let err = node.join().await.unwrap_err();
        assert!(format!("{err:#}").contains("event pump"));
    }
}
