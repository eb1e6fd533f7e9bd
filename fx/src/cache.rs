//! Per-source freshness state machine.

use std::sync::Arc;
use std::time::Duration;

use fxrate_common::{time, Timestamp};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{FxError, FxResult};
use crate::graph::RateGraph;
use crate::source::RateSource;

/// Freshness state of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No successful refresh has ever completed; queries block until
    /// one does.
    Pending,
    /// A refresh is in flight; at most one per source.
    Refreshing,
    /// At least one refresh completed; queries are answered immediately
    /// regardless of staleness.
    Ready,
}

enum FreshState {
    Pending,
    /// Holds the channel attached callers wait on; the refresh drops
    /// the sender when it resolves.
    Refreshing(watch::Receiver<()>),
    Ready,
}

enum GateAction {
    Serve,
    Wait(watch::Receiver<()>),
    Run(watch::Sender<()>),
}

/// Owns one source's rate graph and decides when it must be re-fetched.
///
/// Transitions: Pending -> Refreshing on demand or from the background
/// task; Refreshing -> Ready on fetch success; Refreshing -> Pending on
/// fetch failure, keeping the previous graph contents servable.
pub struct SourceCache {
    name: String,
    source: Arc<dyn RateSource>,
    graph: Arc<RateGraph>,
    state: Mutex<FreshState>,
    last_refreshed: RwLock<Option<Timestamp>>,
}

impl SourceCache {
    /// Create a cache in state Pending with an empty graph.
    pub fn new(name: impl Into<String>, source: Arc<dyn RateSource>) -> Self {
        Self {
            name: name.into(),
            source,
            graph: Arc::new(RateGraph::new()),
            state: Mutex::new(FreshState::Pending),
            last_refreshed: RwLock::new(None),
        }
    }

    /// The source name this cache serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The graph owned by this cache.
    pub fn graph(&self) -> Arc<RateGraph> {
        Arc::clone(&self.graph)
    }

    /// Completion time of the most recent successful refresh.
    pub fn last_refreshed(&self) -> Option<Timestamp> {
        *self.last_refreshed.read()
    }

    /// Current freshness state.
    pub fn status(&self) -> CacheStatus {
        match &*self.state.lock() {
            FreshState::Pending => CacheStatus::Pending,
            FreshState::Refreshing(_) => CacheStatus::Refreshing,
            FreshState::Ready => CacheStatus::Ready,
        }
    }

    /// Return the graph, refreshing first unless the cache is Ready.
    ///
    /// Callers arriving while a refresh is in flight attach to it
    /// instead of invoking the adapter again.
    pub async fn ensure_fresh(&self) -> FxResult<Arc<RateGraph>> {
        loop {
            let action = {
                let mut state = self.state.lock();
                match &*state {
                    FreshState::Ready => GateAction::Serve,
                    FreshState::Refreshing(rx) => GateAction::Wait(rx.clone()),
                    FreshState::Pending => {
                        let (tx, rx) = watch::channel(());
                        *state = FreshState::Refreshing(rx);
                        GateAction::Run(tx)
                    }
                }
            };
            match action {
                GateAction::Serve => return Ok(self.graph()),
                GateAction::Wait(mut rx) => {
                    // Resolves when the in-flight refresh drops its sender.
                    let _ = rx.changed().await;
                }
                GateAction::Run(tx) => return self.run_refresh(tx).await,
            }
        }
    }

    /// Force a refresh even when Ready, sharing the in-flight gate.
    ///
    /// Used by the background task so timer-driven and demand-driven
    /// refreshes never race each other.
    pub async fn refresh(&self) -> FxResult<Arc<RateGraph>> {
        let action = {
            let mut state = self.state.lock();
            match &*state {
                FreshState::Refreshing(rx) => GateAction::Wait(rx.clone()),
                FreshState::Pending | FreshState::Ready => {
                    let (tx, rx) = watch::channel(());
                    *state = FreshState::Refreshing(rx);
                    GateAction::Run(tx)
                }
            }
        };
        match action {
            GateAction::Wait(mut rx) => {
                let _ = rx.changed().await;
                Ok(self.graph())
            }
            GateAction::Run(tx) => self.run_refresh(tx).await,
            GateAction::Serve => unreachable!(),
        }
    }

    async fn run_refresh(&self, done: watch::Sender<()>) -> FxResult<Arc<RateGraph>> {
        debug!(source = %self.name, "Refreshing source");
        let fetched = self.source.fetch().await;

        let outcome = {
            let mut state = self.state.lock();
            match fetched {
                Ok(quads) => {
                    let entries = quads.len();
                    self.graph.replace_all(quads);
                    *self.last_refreshed.write() = Some(time::now());
                    *state = FreshState::Ready;
                    info!(source = %self.name, entries, "Source refreshed");
                    Ok(self.graph())
                }
                Err(err) => {
                    // Revert to Pending so the next access re-attempts the
                    // fetch. The previous graph contents are untouched.
                    *state = FreshState::Pending;
                    warn!(source = %self.name, error = %err, "Source refresh failed");
                    if self.last_refreshed.read().is_some() {
                        Ok(self.graph())
                    } else {
                        Err(FxError::FetchFailed {
                            source_name: self.name.clone(),
                            message: err.to_string(),
                        })
                    }
                }
            }
        };

        // Wake every attached caller.
        drop(done);
        outcome
    }

    /// Spawn the periodic refresh task for this cache.
    ///
    /// The first tick fires immediately, doubling as the startup
    /// refresh. The handle must be aborted at source teardown.
    pub fn spawn_refresh_task(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh().await {
                    warn!(source = %self.name, error = %err, "Scheduled refresh failed");
                }
            }
        })
    }
}
