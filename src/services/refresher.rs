//! Refresh orchestrator.
//!
//! One cycle: fetch the ranked leaderboard, reject it unless sane, then commit
//! in order: replace in memory, persist the cache file, append a snapshot
//! (only after the persist succeeded), broadcast. Past the countdown deadline
//! every cycle is skipped. Failures are logged and absorbed here; nothing
//! escapes a scheduled cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::LiveState;
use crate::config::RefreshConfig;
use crate::domain::{LiveLeaderboard, PlayerRecord, Snapshot};
use crate::persistence::SnapshotStore;

/// Source of normalized ranking data for a refresh cycle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankedSource: Send + Sync {
    /// Current records; empty when nothing is available this cycle.
    async fn fetch_ranked(&self) -> Vec<PlayerRecord>;
}

/// What a single refresh cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CycleOutcome {
    /// Countdown deadline has passed; nothing fetched
    Frozen,
    /// New leaderboard committed
    Updated { count: usize },
    /// Fetch result was empty or malformed; previous state kept
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// A result may replace the cached state only if it is non-empty and every
/// record has an identifier and a finite, non-negative total.
pub fn is_sane(records: &[PlayerRecord]) -> bool {
    !records.is_empty()
        && records
            .iter()
            .all(|p| !p.id.trim().is_empty() && p.points.is_finite() && p.points >= 0.0)
}

pub struct Refresher {
    source: Arc<dyn RankedSource>,
    live: Arc<LiveState>,
    store: Arc<SnapshotStore>,
    config: RefreshConfig,
    /// Scheduled and forced cycles never overlap
    cycle_lock: Mutex<()>,
    refreshing: AtomicBool,
}

impl Refresher {
    pub fn new(
        source: Arc<dyn RankedSource>,
        live: Arc<LiveState>,
        store: Arc<SnapshotStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            source,
            live,
            store,
            config,
            cycle_lock: Mutex::new(()),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        if self.refreshing.load(Ordering::SeqCst) {
            RefreshPhase::Refreshing
        } else {
            RefreshPhase::Idle
        }
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as if the clock read `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleOutcome {
        let _guard = self.cycle_lock.lock().await;

        if self.live.is_frozen(now).await {
            debug!("Countdown deadline passed, leaderboard frozen; skipping refresh");
            return CycleOutcome::Frozen;
        }

        self.refreshing.store(true, Ordering::SeqCst);
        let outcome = self.refresh(now).await;
        self.refreshing.store(false, Ordering::SeqCst);
        outcome
    }

    async fn refresh(&self, now: DateTime<Utc>) -> CycleOutcome {
        let records = self.source.fetch_ranked().await;
        if !is_sane(&records) {
            warn!(
                "Refresh rejected: {} record(s) not sane, keeping previous leaderboard",
                records.len()
            );
            return CycleOutcome::Rejected;
        }

        let board = LiveLeaderboard::new(now, records);
        let count = board.len();
        let board = self.live.replace(board).await;

        match self.live.persist(&board).await {
            Ok(()) => {
                let snapshot = Snapshot::from_records(now.timestamp_millis(), &board.entries);
                if let Err(e) = self.store.append(&snapshot).await {
                    error!("Failed to append snapshot: {}", e);
                }
            }
            Err(e) => {
                error!(
                    "Failed to persist leaderboard to {}: {}; snapshot not appended",
                    self.live.cache_path().display(),
                    e
                );
            }
        }

        let receivers = self.live.broadcast(board);
        info!(
            "Leaderboard refreshed: {} players, broadcast to {} subscriber(s)",
            count, receivers
        );
        CycleOutcome::Updated { count }
    }

    /// Warm-up cycle after `warmup_secs`, then one cycle every `interval_secs`
    /// until `shutdown` flips to true or its sender is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let warmup = Duration::from_secs(self.config.warmup_secs);
        let period = Duration::from_secs(self.config.interval_secs.max(1));

        tokio::select! {
            _ = tokio::time::sleep(warmup) => {}
            _ = shutdown.changed() => {
                info!("Refresher stopped before warm-up");
                return;
            }
        }
        self.run_cycle().await;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Refresher stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
