//! Calls awaiting their response on the push connection.
//!
//! Maps request ids to waiting callers:
//! 1. The caller registers and gets an id plus a oneshot receiver
//! 2. The request goes out tagged with that id
//! 3. The reader task matches the response id and completes the call
//! 4. If the connection drops, every outstanding call is failed

use crate::domain::FeedError;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::debug;

pub type CallResult = Result<Value, FeedError>;

struct PendingCall {
    sender: oneshot::Sender<CallResult>,
    method: String,
    created_at: Instant,
}

pub struct PendingCalls {
    pending: DashMap<u64, PendingCall>,
    next_id: AtomicU64,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, method: &str) -> (u64, oneshot::Receiver<CallResult>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(
            id,
            PendingCall {
                sender,
                method: method.to_string(),
                created_at: Instant::now(),
            },
        );
        (id, receiver)
    }

    /// Deliver the response for `id`. False when nobody is waiting (late
    /// response after a timeout, or an id the server made up).
    pub fn complete(&self, id: u64, result: CallResult) -> bool {
        let Some((_, call)) = self.pending.remove(&id) else {
            debug!(id, "Response for unknown or expired call");
            return false;
        };
        debug!(
            id,
            method = %call.method,
            elapsed_ms = call.created_at.elapsed().as_millis() as u64,
            "Call completed"
        );
        call.sender.send(result).is_ok()
    }

    /// Forget a call the caller gave up on.
    pub fn cancel(&self, id: u64) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Fail every outstanding call. Returns how many there were.
    pub fn fail_all(&self, error: &FeedError) -> usize {
        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        let mut failed = 0;
        for id in ids {
            if let Some((_, call)) = self.pending.remove(&id) {
                let _ = call.sender.send(Err(error.clone()));
                failed += 1;
            }
        }
        failed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_complete_delivers_result() {
        let calls = PendingCalls::new();
        let (id, rx) = calls.register("getblockcount");

        assert!(calls.complete(id, Ok(json!(7))));
        assert_eq!(rx.await.unwrap(), Ok(json!(7)));
        assert!(calls.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let calls = PendingCalls::new();
        let (a, _ra) = calls.register("a");
        let (b, _rb) = calls.register("b");
        assert_ne!(a, b);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn test_unknown_and_cancelled_ids() {
        let calls = PendingCalls::new();
        assert!(!calls.complete(99, Ok(Value::Null)));

        let (id, _rx) = calls.register("getrawmempool");
        assert!(calls.cancel(id));
        assert!(!calls.complete(id, Ok(Value::Null)));
    }

    #[tokio::test]
    async fn test_fail_all() {
        let calls = PendingCalls::new();
        let (_, rx1) = calls.register("a");
        let (_, rx2) = calls.register("b");
        let closed = FeedError::Closed {
            stream: "push connection".into(),
        };

        assert_eq!(calls.fail_all(&closed), 2);
        assert_eq!(rx1.await.unwrap(), Err(closed.clone()));
        assert_eq!(rx2.await.unwrap(), Err(closed));
        assert!(calls.is_empty());
    }
}
