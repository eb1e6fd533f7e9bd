//! Source adapter trait.

use async_trait::async_trait;
use fxrate_common::RateQuad;
use thiserror::Error;

/// Opaque failure from a source adapter.
///
/// Adapter failures are never interpreted by the cache; they only cause
/// a state transition and are logged.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SourceError(String);

impl SourceError {
    /// Create a new source error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A bank adapter that produces canonical rate records.
///
/// One implementation exists per registered source. `fetch` is invoked
/// by the source cache only; callers never talk to an adapter directly.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// The source name, used as the registry key.
    fn name(&self) -> &str;

    /// Fetch the current batch of quoted rates.
    async fn fetch(&self) -> Result<Vec<RateQuad>, SourceError>;
}

/// Mock source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    quads: parking_lot::Mutex<Vec<RateQuad>>,
    fail: std::sync::atomic::AtomicBool,
    fetch_count: std::sync::atomic::AtomicUsize,
    delay: parking_lot::Mutex<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a mock source with no quotes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quads: parking_lot::Mutex::new(Vec::new()),
            fail: std::sync::atomic::AtomicBool::new(false),
            fetch_count: std::sync::atomic::AtomicUsize::new(0),
            delay: parking_lot::Mutex::new(None),
        }
    }

    /// Replace the batch the next fetch returns.
    pub fn set_quads(&self, quads: Vec<RateQuad>) {
        *self.quads.lock() = quads;
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Delay each fetch, for exercising the refresh gate.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Number of fetches performed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RateQuad>, SourceError> {
        self.fetch_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SourceError::new("mock fetch failure"));
        }
        Ok(self.quads.lock().clone())
    }
}
