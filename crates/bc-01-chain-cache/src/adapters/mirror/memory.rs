use super::{decode, encode};
use crate::domain::errors::MirrorError;
use crate::ports::outbound::MirrorStore;
use parking_lot::Mutex;
use shared_types::ChainSnapshot;
use std::sync::Arc;

const LOCATION: &str = "memory";

#[derive(Debug, Default)]
struct Inner {
    text: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory mirror for testing.
///
/// Stores the encoded text rather than the snapshot so the serialization
/// path is exercised. Clones share state, letting a test keep a handle
/// after moving the mirror into a service.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMirror {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryMirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mirror that already holds `snapshot`.
    pub fn with_snapshot(snapshot: &ChainSnapshot) -> Result<Self, MirrorError> {
        let mirror = Self::new();
        mirror.inner.lock().text = Some(encode(snapshot)?);
        Ok(mirror)
    }

    /// A mirror holding arbitrary raw text.
    #[must_use]
    pub fn with_raw(text: impl Into<String>) -> Self {
        let mirror = Self::new();
        mirror.inner.lock().text = Some(text.into());
        mirror
    }

    /// Make subsequent writes fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Overwrite the stored text behind the service's back.
    pub fn tamper(&self, text: impl Into<String>) {
        self.inner.lock().text = Some(text.into());
    }

    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.inner.lock().text.clone()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }
}

impl MirrorStore for InMemoryMirror {
    fn load(&self) -> Result<Option<ChainSnapshot>, MirrorError> {
        let inner = self.inner.lock();
        inner
            .text
            .as_deref()
            .map(|text| decode(text, LOCATION))
            .transpose()
    }

    fn store(&mut self, snapshot: &ChainSnapshot) -> Result<(), MirrorError> {
        let text = encode(snapshot)?;
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(MirrorError::Io {
                location: LOCATION.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        inner.text = Some(text);
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self) -> Result<bool, MirrorError> {
        Ok(self.inner.lock().text.take().is_some())
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}
