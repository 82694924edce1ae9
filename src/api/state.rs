use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::AdminConfig;
use crate::services::{LiveState, Refresher, WindowedGainCalculator};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Live leaderboard, contest window and countdown
    pub live: Arc<LiveState>,

    /// Windowed queries over the snapshot log
    pub gains: Arc<WindowedGainCalculator>,

    /// Used by the admin endpoint to force a cycle
    pub refresher: Arc<Refresher>,

    /// Admin shared-secret settings
    pub admin: Arc<AdminConfig>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        live: Arc<LiveState>,
        gains: Arc<WindowedGainCalculator>,
        refresher: Arc<Refresher>,
        admin: AdminConfig,
    ) -> Self {
        Self {
            live,
            gains,
            refresher,
            admin: Arc::new(admin),
            start_time: Utc::now(),
        }
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
