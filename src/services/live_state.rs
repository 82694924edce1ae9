//! Live state holder.
//!
//! Owns the current full-history leaderboard, the contest window and the
//! countdown deadline. The leaderboard is swapped as a whole `Arc`, so readers
//! keep a consistent view for as long as they hold it.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::domain::{ContestWindow, LiveLeaderboard};
use crate::error::Result;
use crate::persistence::{load_leaderboard, save_leaderboard};

/// Leaderboard broadcast channel capacity
const CHANNEL_CAPACITY: usize = 16;

pub struct LiveState {
    leaderboard: RwLock<Arc<LiveLeaderboard>>,
    window: RwLock<ContestWindow>,
    countdown: RwLock<Option<DateTime<Utc>>>,
    cache_path: PathBuf,
    tx: broadcast::Sender<Arc<LiveLeaderboard>>,
}

impl LiveState {
    /// Empty state persisting to `cache_path`.
    pub fn new(cache_path: impl Into<PathBuf>, countdown: Option<DateTime<Utc>>) -> Self {
        Self::with_leaderboard(cache_path, countdown, LiveLeaderboard::default())
    }

    fn with_leaderboard(
        cache_path: impl Into<PathBuf>,
        countdown: Option<DateTime<Utc>>,
        board: LiveLeaderboard,
    ) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            leaderboard: RwLock::new(Arc::new(board)),
            window: RwLock::new(ContestWindow::default()),
            countdown: RwLock::new(countdown),
            cache_path: cache_path.into(),
            tx,
        }
    }

    /// Start from the persisted cache file when it can be read.
    pub async fn load(cache_path: impl Into<PathBuf>, countdown: Option<DateTime<Utc>>) -> Self {
        let cache_path = cache_path.into();
        let board = match load_leaderboard(&cache_path).await {
            Ok(Some(board)) => {
                info!(
                    "Loaded {} cached leaderboard entries from {}",
                    board.len(),
                    cache_path.display()
                );
                board
            }
            Ok(None) => LiveLeaderboard::default(),
            Err(e) => {
                warn!(
                    "Ignoring unreadable leaderboard cache {}: {}",
                    cache_path.display(),
                    e
                );
                LiveLeaderboard::default()
            }
        };
        Self::with_leaderboard(cache_path, countdown, board)
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub async fn leaderboard(&self) -> Arc<LiveLeaderboard> {
        self.leaderboard.read().await.clone()
    }

    /// Swap in a new leaderboard and return the shared handle to it.
    pub async fn replace(&self, board: LiveLeaderboard) -> Arc<LiveLeaderboard> {
        let board = Arc::new(board);
        *self.leaderboard.write().await = board.clone();
        board
    }

    pub async fn persist(&self, board: &LiveLeaderboard) -> Result<()> {
        save_leaderboard(&self.cache_path, board).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LiveLeaderboard>> {
        self.tx.subscribe()
    }

    /// Fan out to subscribers. Having none is not an error.
    pub fn broadcast(&self, board: Arc<LiveLeaderboard>) -> usize {
        self.tx.send(board).unwrap_or(0)
    }

    pub async fn contest_window(&self) -> ContestWindow {
        *self.window.read().await
    }

    pub async fn set_contest_window(&self, window: ContestWindow) {
        *self.window.write().await = window;
    }

    pub async fn countdown(&self) -> Option<DateTime<Utc>> {
        *self.countdown.read().await
    }

    pub async fn set_countdown(&self, deadline: Option<DateTime<Utc>>) {
        *self.countdown.write().await = deadline;
    }

    /// Past the countdown deadline the leaderboard no longer changes.
    pub async fn is_frozen(&self, now: DateTime<Utc>) -> bool {
        self.countdown().await.is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlayerRecord;
    use chrono::Duration;

    #[tokio::test]
    async fn test_replace_is_visible_to_new_readers_only() {
        let state = LiveState::new(std::env::temp_dir().join("unused.json"), None);
        let before = state.leaderboard().await;

        state
            .replace(LiveLeaderboard::new(
                Utc::now(),
                vec![PlayerRecord::new("a", "A", 1.0)],
            ))
            .await;

        assert!(before.is_empty());
        assert_eq!(state.leaderboard().await.len(), 1);
    }

    #[tokio::test]
    async fn test_frozen_after_deadline() {
        let now = Utc::now();
        let state = LiveState::new(std::env::temp_dir().join("unused.json"), None);
        assert!(!state.is_frozen(now).await);

        state.set_countdown(Some(now - Duration::seconds(1))).await;
        assert!(state.is_frozen(now).await);

        state.set_countdown(Some(now + Duration::hours(1))).await;
        assert!(!state.is_frozen(now).await);
    }

    #[tokio::test]
    async fn test_corrupt_cache_loads_empty() {
        let dir = std::env::temp_dir().join(format!(
            "wagerboard_live_{}",
            Utc::now().timestamp_nanos_opt().unwrap_or(0)
        ));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("cache.json");
        tokio::fs::write(&path, "garbage").await.unwrap();

        let state = LiveState::load(&path, None).await;
        assert!(state.leaderboard().await.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
