//! # Browser Sessions
//!
//! Real WebSocket clients against a running process: the catch-up
//! sequence, live events in order, keep-alive and disconnects.

#[cfg(test)]
mod tests {
    use crate::integration::{config_in, eventually, parse_event, TestNode, WAIT};
    use bc_03_feed::{MockFeed, TxNotice};
    use futures::{SinkExt, Stream, StreamExt};
    use serde_json::Value;
    use shared_types::fixtures::tx_summary;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            let message = tokio::time::timeout(WAIT, ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("socket ended")
                .unwrap();
            if let Message::Text(text) = message {
                return text.as_str().to_string();
            }
        }
    }

    async fn node_with_mempool(pending: u64) -> (TempDir, TestNode) {
        let dir = TempDir::new().unwrap();
        let feed = Arc::new(MockFeed::with_chain(0..=30));
        for seed in 1..=pending {
            feed.add_transaction(tx_summary(seed, 1));
        }
        let node = TestNode::start(feed, config_in(dir.path())).await;
        (dir, node)
    }

    #[tokio::test]
    async fn test_session_catches_up_then_goes_live() {
        let (_dir, node) = node_with_mempool(2).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", node.addr))
            .await
            .unwrap();

        let open = next_text(&mut ws).await;
        let open: Value = serde_json::from_str(open.strip_prefix('0').unwrap()).unwrap();
        assert!(open["sid"].is_string());
        assert_eq!(open["upgrades"], Value::Array(vec![]));

        let (name, blocks) = parse_event(&next_text(&mut ws).await);
        assert_eq!(name, "blocks");
        assert_eq!(blocks.as_object().unwrap().len(), 20);

        for seed in 1..=2 {
            let (name, tx) = parse_event(&next_text(&mut ws).await);
            assert_eq!(name, "tx");
            assert_eq!(tx["hash"], tx_summary(seed, 1).hash.to_string());
        }

        let registry = node.registry.clone();
        assert!(eventually(|| registry.live_count() == 1).await);

        let fresh = tx_summary(50, 2);
        node.feed.add_transaction(fresh.clone());
        node.feed.announce_tx(TxNotice::Id(fresh.hash));
        let (name, tx) = parse_event(&next_text(&mut ws).await);
        assert_eq!(name, "tx");
        assert_eq!(tx["hash"], fresh.hash.to_string());

        node.feed.mine(31);
        let (name, blocks) = parse_event(&next_text(&mut ws).await);
        assert_eq!(name, "blocks");
        assert!(blocks.get("31").is_some());
        assert!(blocks.get("11").is_none());

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let (_dir, node) = node_with_mempool(0).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", node.addr))
            .await
            .unwrap();
        next_text(&mut ws).await;
        next_text(&mut ws).await;

        ws.send(Message::text("2")).await.unwrap();
        assert_eq!(next_text(&mut ws).await, "3");

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_every_client_sees_the_same_order() {
        let (_dir, node) = node_with_mempool(0).await;
        let url = format!("ws://{}/", node.addr);
        let (mut first, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        let (mut second, _) = tokio_tungstenite::connect_async(url.as_str()).await.unwrap();
        for ws in [&mut first, &mut second] {
            next_text(ws).await;
            next_text(ws).await;
        }
        let registry = node.registry.clone();
        assert!(eventually(|| registry.live_count() == 2).await);

        let summaries: Vec<_> = (60..65).map(|seed| tx_summary(seed, 1)).collect();
        for summary in &summaries {
            node.feed.add_transaction(summary.clone());
            node.feed.announce_tx(TxNotice::Id(summary.hash));
        }

        for ws in [&mut first, &mut second] {
            for summary in &summaries {
                let (_, tx) = parse_event(&next_text(ws).await);
                assert_eq!(tx["hash"], summary.hash.to_string());
            }
        }

        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_removes_subscriber() {
        let (_dir, node) = node_with_mempool(0).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", node.addr))
            .await
            .unwrap();
        next_text(&mut ws).await;

        let registry = node.registry.clone();
        assert!(eventually(|| registry.len() == 1).await);
        ws.close(None).await.unwrap();
        assert!(eventually(|| registry.is_empty()).await);

        // Broadcasting with nobody connected is not an error.
        node.feed.mine(31);
        node.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_sessions() {
        let (_dir, node) = node_with_mempool(0).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", node.addr))
            .await
            .unwrap();
        next_text(&mut ws).await;
        next_text(&mut ws).await;

        node.stop().await.unwrap();

        let ended = tokio::time::timeout(WAIT, async {
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        })
        .await;
        assert!(ended.is_ok());
    }
}
