//! # Chain Cache Service Tests

use super::*;
use crate::adapters::{FixedTimeSource, InMemoryMirror, JsonFileMirror};
use crate::domain::errors::HeaderSourceError;
use crate::ports::outbound::HeaderSource;
use async_trait::async_trait;
use shared_types::fixtures::{block_hash, header};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

const NOW: u64 = 1_700_000_000;

/// Node stand-in that serves fixture headers up to `tip`.
struct FixtureSource {
    tip: u64,
    fail_at: Option<u64>,
    calls: AtomicUsize,
}

impl FixtureSource {
    fn at(tip: u64) -> Self {
        Self {
            tip,
            fail_at: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HeaderSource for FixtureSource {
    async fn current_height(&self) -> Result<u64, HeaderSourceError> {
        Ok(self.tip)
    }

    async fn header_at(&self, height: u64) -> Result<BlockHeader, HeaderSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(height) {
            return Err(HeaderSourceError::Unavailable {
                message: "connection reset".to_string(),
            });
        }
        if height > self.tip {
            return Err(HeaderSourceError::NotFound { height });
        }
        Ok(header(height))
    }
}

fn make_test_service(
    mirror: InMemoryMirror,
) -> (ChainCacheService<InMemoryMirror, FixedTimeSource>, FixedTimeSource) {
    let clock = FixedTimeSource::new(NOW);
    let service = ChainCacheService::new(CacheConfig::default(), mirror, clock.clone()).unwrap();
    (service, clock)
}

fn full_mirror(range: std::ops::RangeInclusive<u64>) -> InMemoryMirror {
    InMemoryMirror::with_snapshot(&range.map(header).collect()).unwrap()
}

#[tokio::test]
async fn test_cold_start_backfills_most_recent_blocks() {
    let mirror = InMemoryMirror::new();
    let (mut service, _) = make_test_service(mirror.clone());
    let source = FixtureSource::at(800_000);

    let outcome = service.initialize(&source).await.unwrap();

    assert_eq!(
        outcome,
        InitOutcome::Backfilled {
            from: 799_981,
            to: 800_000
        }
    );
    let snapshot = service.snapshot();
    assert_eq!(snapshot.heights().collect::<Vec<_>>(), (799_981..=800_000).collect::<Vec<_>>());
    // Backfilled headers were never observed locally.
    assert!(snapshot.iter().all(|h| h.recv_time == h.chain_time));
    assert_eq!(mirror.load().unwrap(), Some((*snapshot).clone()));
}

#[tokio::test]
async fn test_cold_start_near_genesis_clamps_at_zero() {
    let (mut service, _) = make_test_service(InMemoryMirror::new());

    service.initialize(&FixtureSource::at(4)).await.unwrap();

    assert_eq!(service.len(), 5);
    assert_eq!(service.snapshot().oldest().map(|h| h.height), Some(0));
}

#[tokio::test]
async fn test_warm_start_does_not_touch_node() {
    let mirror = full_mirror(101..=120);
    let (mut service, _) = make_test_service(mirror.clone());
    let source = FixtureSource::at(500);

    let outcome = service.initialize(&source).await.unwrap();

    assert_eq!(outcome, InitOutcome::Loaded { blocks: 20, trimmed: 0 });
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(mirror.writes(), 0);
    assert_eq!(service.snapshot().tip().map(|h| h.height), Some(120));
}

#[tokio::test]
async fn test_oversized_mirror_is_trimmed_and_rewritten() {
    let mirror = full_mirror(1..=30);
    let (mut service, _) = make_test_service(mirror.clone());

    let outcome = service.initialize(&FixtureSource::at(30)).await.unwrap();

    assert_eq!(outcome, InitOutcome::Loaded { blocks: 20, trimmed: 10 });
    assert_eq!(mirror.writes(), 1);
    service.check_integrity().unwrap();
}

#[tokio::test]
async fn test_corrupt_mirror_is_fatal() {
    let (mut service, _) = make_test_service(InMemoryMirror::with_raw("{\"101\": {"));

    let err = service.initialize(&FixtureSource::at(120)).await.unwrap_err();

    assert!(matches!(err, ChainCacheError::CorruptMirror { .. }));
}

#[tokio::test]
async fn test_reset_discards_mirror_and_backfills() {
    let mirror = InMemoryMirror::with_raw("garbage");
    let config = CacheConfig {
        reset: true,
        ..CacheConfig::default()
    };
    let mut service =
        ChainCacheService::new(config, mirror.clone(), FixedTimeSource::new(NOW)).unwrap();

    let outcome = service.initialize(&FixtureSource::at(50)).await.unwrap();

    assert_eq!(outcome, InitOutcome::Backfilled { from: 31, to: 50 });
    service.check_integrity().unwrap();
}

#[tokio::test]
async fn test_backfill_failure_names_height() {
    let (mut service, _) = make_test_service(InMemoryMirror::new());
    let source = FixtureSource {
        fail_at: Some(95),
        ..FixtureSource::at(100)
    };

    let err = service.initialize(&source).await.unwrap_err();

    assert!(matches!(err, ChainCacheError::Backfill { height: 95, .. }));
    assert!(service.is_empty());
}

#[tokio::test]
async fn test_add_block_evicts_oldest_and_persists() {
    let mirror = full_mirror(101..=120);
    let (mut service, _) = make_test_service(mirror.clone());
    service.initialize(&FixtureSource::at(120)).await.unwrap();

    let snapshot = service.add_block(header(121)).unwrap();

    assert_eq!(snapshot.len(), 20);
    assert!(!snapshot.contains(101));
    assert!((102..=121).all(|h| snapshot.contains(h)));
    assert_eq!(snapshot.get(121).map(|h| h.recv_time), Some(NOW));
    assert_eq!(mirror.load().unwrap(), Some((*snapshot).clone()));
    service.check_integrity().unwrap();
}

#[tokio::test]
async fn test_size_bounded_after_every_add() {
    let (mut service, _) = make_test_service(InMemoryMirror::new());
    service.initialize(&FixtureSource::at(10)).await.unwrap();

    for h in 11..60 {
        service.add_block(header(h)).unwrap();
        assert!(service.len() <= service.capacity());
        service.check_integrity().unwrap();
    }
}

#[tokio::test]
async fn test_reannounced_block_keeps_first_receive_time() {
    let (mut service, clock) = make_test_service(full_mirror(101..=120));
    service.initialize(&FixtureSource::at(120)).await.unwrap();

    service.add_block(header(121)).unwrap();
    clock.advance(300);
    let snapshot = service.add_block(header(121)).unwrap();

    assert_eq!(snapshot.get(121).map(|h| h.recv_time), Some(NOW));
}

#[tokio::test]
async fn test_reorg_at_same_height_resets_receive_time() {
    let (mut service, clock) = make_test_service(full_mirror(101..=120));
    service.initialize(&FixtureSource::at(120)).await.unwrap();
    service.add_block(header(121)).unwrap();

    clock.advance(300);
    let mut competitor = header(121);
    competitor.hash = block_hash(0xdead);
    let snapshot = service.add_block(competitor).unwrap();

    let cached = snapshot.get(121).unwrap();
    assert_eq!(cached.hash, block_hash(0xdead));
    assert_eq!(cached.recv_time, NOW + 300);
    assert_eq!(snapshot.len(), 20);
}

#[tokio::test]
async fn test_persist_failure_leaves_cache_unchanged() {
    let mirror = full_mirror(101..=120);
    let (mut service, _) = make_test_service(mirror.clone());
    service.initialize(&FixtureSource::at(120)).await.unwrap();
    let before = service.snapshot();

    mirror.fail_writes(true);
    let err = service.add_block(header(121)).unwrap_err();

    assert!(matches!(err, ChainCacheError::Persist(_)));
    assert_eq!(service.snapshot(), before);
    assert!(service.snapshot().contains(101));
    service.check_integrity().unwrap();
}

#[tokio::test]
async fn test_delivered_snapshot_is_not_mutated_by_later_adds() {
    let (mut service, _) = make_test_service(full_mirror(101..=120));
    service.initialize(&FixtureSource::at(120)).await.unwrap();

    let delivered = service.add_block(header(121)).unwrap();
    let copy = (*delivered).clone();
    service.add_block(header(122)).unwrap();
    service.add_block(header(123)).unwrap();

    assert_eq!(*delivered, copy);
    assert!(delivered.contains(102));
}

#[tokio::test]
async fn test_watchers_see_latest_snapshot() {
    let (mut service, _) = make_test_service(full_mirror(101..=120));
    let mut rx = service.watch();
    service.initialize(&FixtureSource::at(120)).await.unwrap();

    service.add_block(header(121)).unwrap();

    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().tip().map(|h| h.height), Some(121));
}

#[tokio::test]
async fn test_integrity_detects_tampering() {
    let mirror = full_mirror(101..=120);
    let (mut service, _) = make_test_service(mirror.clone());
    service.initialize(&FixtureSource::at(120)).await.unwrap();

    let mut tampered: ChainSnapshot = (102..=121).map(header).collect::<ChainSnapshot>();
    let mut map = tampered.clone().into_inner();
    if let Some(h) = map.get_mut(&110) {
        h.recv_time = 1;
    }
    tampered = ChainSnapshot::new(map);
    mirror.tamper(crate::adapters::mirror::encode(&tampered).unwrap());

    match service.check_integrity() {
        Err(ChainCacheError::IntegrityMismatch {
            missing,
            unexpected,
            differing,
        }) => {
            assert_eq!(missing, vec![101]);
            assert_eq!(unexpected, vec![121]);
            assert_eq!(differing, vec![110]);
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_mirror_consistent_only_with_empty_cache() {
    let mirror = InMemoryMirror::new();
    let (service, _) = make_test_service(mirror.clone());
    service.check_integrity().unwrap();

    let mirror = full_mirror(1..=3);
    let (mut service, _) = make_test_service(mirror.clone());
    service.initialize(&FixtureSource::at(3)).await.unwrap();
    let mut handle = mirror.clone();
    handle.remove().unwrap();
    assert!(service.check_integrity().is_err());
}

#[tokio::test]
async fn test_file_mirror_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("blocks.json");

    {
        let mut service = ChainCacheService::new(
            CacheConfig::default(),
            JsonFileMirror::new(&path),
            FixedTimeSource::new(NOW),
        )
        .unwrap();
        service.initialize(&FixtureSource::at(120)).await.unwrap();
        service.add_block(header(121)).unwrap();
    }

    // Restart: the mirror is the source of truth.
    let mut service = ChainCacheService::new(
        CacheConfig::default(),
        JsonFileMirror::new(&path),
        FixedTimeSource::new(NOW + 600),
    )
    .unwrap();
    let source = FixtureSource::at(9_999);
    let outcome = service.initialize(&source).await.unwrap();

    assert_eq!(outcome, InitOutcome::Loaded { blocks: 20, trimmed: 0 });
    assert_eq!(service.snapshot().tip().map(|h| (h.height, h.recv_time)), Some((121, NOW)));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    let text = std::fs::read_to_string(&path).unwrap();
    let on_disk: ChainSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk, *service.snapshot());
}
