//! Ranked players and the live leaderboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ranked participant as reported by the upstream ranking API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Stable external identifier, unique within one leaderboard
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Cumulative total, or a window gain when produced by the gain calculator
    pub points: f64,
}

impl PlayerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, points: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
            points,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Sort by points descending. Stable, so equal scores keep their input order.
pub fn sort_by_points_desc(entries: &mut [PlayerRecord]) {
    entries.sort_by(|a, b| b.points.total_cmp(&a.points));
}

/// The always-current full-history ranking.
///
/// Serialized as `{ "updatedAt": ..., "data": [...] }`, which is both the
/// persisted cache file format and the read endpoint payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveLeaderboard {
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "data", default)]
    pub entries: Vec<PlayerRecord>,
}

impl LiveLeaderboard {
    /// Build a leaderboard from unsorted records.
    pub fn new(updated_at: DateTime<Utc>, mut entries: Vec<PlayerRecord>) -> Self {
        sort_by_points_desc(&mut entries);
        Self {
            updated_at: Some(updated_at),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_sorts_descending_and_keeps_ties_stable() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let board = LiveLeaderboard::new(
            ts,
            vec![
                PlayerRecord::new("a", "Alice", 10.0),
                PlayerRecord::new("b", "Bob", 30.0),
                PlayerRecord::new("c", "Carol", 10.0),
            ],
        );

        let ids: Vec<&str> = board.entries.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(board.updated_at, Some(ts));
    }

    #[test]
    fn test_cache_file_shape() {
        let raw = r#"{"updatedAt":null,"data":[{"id":"x","name":"X","avatar":null,"points":4.5}]}"#;
        let board: LiveLeaderboard = serde_json::from_str(raw).unwrap();
        assert!(board.updated_at.is_none());
        assert_eq!(board.entries[0].points, 4.5);

        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("data").is_some());
    }
}
