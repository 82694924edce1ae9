//! Point-in-time totals, one per refresh.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PlayerRecord;

/// One timestamped capture of every user's cumulative total.
///
/// On disk this is one NDJSON line: `{ "ts": <epoch ms>, "p": { id: points } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "ts")]
    pub timestamp: i64,
    #[serde(rename = "p")]
    pub totals: BTreeMap<String, f64>,
}

impl Snapshot {
    pub fn new(timestamp: i64, totals: BTreeMap<String, f64>) -> Self {
        Self { timestamp, totals }
    }

    /// Capture the totals of a ranked leaderboard.
    pub fn from_records(timestamp: i64, records: &[PlayerRecord]) -> Self {
        let totals = records
            .iter()
            .map(|p| (p.id.clone(), p.points))
            .collect();
        Self { timestamp, totals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let snap = Snapshot::from_records(
            42,
            &[
                PlayerRecord::new("A", "a", 10.0),
                PlayerRecord::new("B", "b", 2.5),
            ],
        );
        let line = serde_json::to_string(&snap).unwrap();
        assert_eq!(line, r#"{"ts":42,"p":{"A":10.0,"B":2.5}}"#);
    }
}
