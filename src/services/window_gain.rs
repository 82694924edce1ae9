//! Windowed gain reconstruction.
//!
//! The upstream only reports current cumulative totals. Points earned inside
//! `[start, end]` are rebuilt from the snapshot log: per user, the last total
//! seen before `start` is the baseline (falling back to the first total seen
//! inside the window) and the highest total seen inside the window is the
//! peak. Gain is `max(0, peak - baseline)`. Accuracy is bounded by snapshot
//! density.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use super::LiveState;
use crate::domain::{sort_by_points_desc, LiveLeaderboard, PlayerRecord, Snapshot};
use crate::persistence::SnapshotStore;

#[derive(Debug, Clone, Copy)]
struct InWindow {
    first: f64,
    peak: f64,
}

/// Gains per user inside `[start, end]` (inclusive), sorted descending.
///
/// Users with no snapshot inside the window, and users whose gain is zero,
/// are left out. Names and avatars come from `live`; users it no longer lists
/// get `"Player {id}"` and no avatar.
pub fn compute_window_gains(
    snapshots: &[Snapshot],
    start: i64,
    end: i64,
    live: &LiveLeaderboard,
) -> Vec<PlayerRecord> {
    if start > end {
        return Vec::new();
    }

    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut baseline: HashMap<&str, f64> = HashMap::new();
    let mut window: BTreeMap<&str, InWindow> = BTreeMap::new();

    for snap in ordered {
        if snap.timestamp < start {
            for (id, total) in &snap.totals {
                baseline.insert(id.as_str(), *total);
            }
        } else if snap.timestamp <= end {
            for (id, total) in &snap.totals {
                window
                    .entry(id.as_str())
                    .and_modify(|w| w.peak = w.peak.max(*total))
                    .or_insert(InWindow {
                        first: *total,
                        peak: *total,
                    });
            }
        } else {
            break;
        }
    }

    let profiles: HashMap<&str, &PlayerRecord> =
        live.entries.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut gains: Vec<PlayerRecord> = window
        .into_iter()
        .filter_map(|(id, obs)| {
            let base = baseline.get(id).copied().unwrap_or(obs.first);
            let gain = (obs.peak - base).max(0.0);
            if gain <= 0.0 {
                return None;
            }
            let (name, avatar) = match profiles.get(id) {
                Some(p) => (p.name.clone(), p.avatar.clone()),
                None => (format!("Player {}", id), None),
            };
            Some(PlayerRecord {
                id: id.to_string(),
                name,
                avatar,
                points: gain,
            })
        })
        .collect();

    sort_by_points_desc(&mut gains);
    gains
}

/// Serves windowed queries from the snapshot log and the live leaderboard.
pub struct WindowedGainCalculator {
    store: Arc<SnapshotStore>,
    live: Arc<LiveState>,
}

impl WindowedGainCalculator {
    pub fn new(store: Arc<SnapshotStore>, live: Arc<LiveState>) -> Self {
        Self { store, live }
    }

    /// Gains inside `[start, end]`. An unreadable log yields an empty result.
    pub async fn compute_windowed(&self, start: i64, end: i64) -> Vec<PlayerRecord> {
        let snapshots = match self.store.read_all().await {
            Ok(s) => s,
            Err(e) => {
                warn!("Snapshot log unreadable, serving empty window: {}", e);
                return Vec::new();
            }
        };
        let live = self.live.leaderboard().await;
        let gains = compute_window_gains(&snapshots, start, end, &live);
        debug!(
            "Window [{}, {}] scanned {} snapshots, {} users with gains",
            start,
            end,
            snapshots.len(),
            gains.len()
        );
        gains
    }
}
