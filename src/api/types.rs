use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContestWindow, PlayerRecord};
use crate::services::{CycleOutcome, RefreshPhase};

// ============================================================================
// Leaderboard Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowedLeaderboardResponse {
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    /// `None` when the live leaderboard was served unmodified
    pub window: Option<ContestWindow>,
    pub data: Vec<PlayerRecord>,
}

/// Ad-hoc window bounds in epoch milliseconds. Kept as strings so that a
/// malformed bound produces an empty result instead of a rejected request.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl WindowQuery {
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let start = self.start.as_deref()?.trim().parse::<i64>().ok()?;
        let end = self.end.as_deref()?.trim().parse::<i64>().ok()?;
        (start <= end).then_some((start, end))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardMeta {
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    pub count: usize,
    pub window: ContestWindow,
    pub countdown: Option<DateTime<Utc>>,
    pub frozen: bool,
    pub phase: RefreshPhase,
}

// ============================================================================
// Admin Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetWindowRequest {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetCountdownRequest {
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    #[serde(flatten)]
    pub outcome: CycleOutcome,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Health Check Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "uptimeSeconds")]
    pub uptime_seconds: i64,
}

// ============================================================================
// WebSocket Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    Leaderboard {
        #[serde(rename = "updatedAt")]
        updated_at: Option<DateTime<Utc>>,
        data: Vec<PlayerRecord>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> WindowQuery {
        WindowQuery {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        }
    }

    #[test]
    fn test_window_query_bounds() {
        assert_eq!(query(Some("5"), Some("15")).bounds(), Some((5, 15)));
        assert_eq!(query(Some("15"), Some("5")).bounds(), None);
        assert_eq!(query(Some("abc"), Some("5")).bounds(), None);
        assert_eq!(query(None, Some("5")).bounds(), None);
    }

    #[test]
    fn test_meta_shape() {
        let meta = LeaderboardMeta {
            updated_at: None,
            count: 3,
            window: ContestWindow::new(Some(5), None),
            countdown: None,
            frozen: false,
            phase: RefreshPhase::Refreshing,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["window"]["start"], 5);
        assert_eq!(json["phase"], "refreshing");
        assert!(json["updatedAt"].is_null());
    }

    #[test]
    fn test_ws_message_shape() {
        let msg = WsMessage::Leaderboard {
            updated_at: None,
            data: vec![PlayerRecord::new("a", "A", 1.0)],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "leaderboard");
        assert_eq!(json["data"][0]["id"], "a");
    }
}
