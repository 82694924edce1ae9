//! Contest window bounds.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Admin-set contest window, bounds in epoch milliseconds.
///
/// A window without `start` is inactive and the live leaderboard is served
/// as-is. A missing `end` means "up to now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestWindow {
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub end: Option<i64>,
}

impl ContestWindow {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    pub fn is_active(&self) -> bool {
        self.start.is_some()
    }

    /// Concrete `[start, end]` bounds, or `None` when inactive.
    pub fn resolve(&self) -> Option<(i64, i64)> {
        let start = self.start?;
        let end = self.end.unwrap_or_else(|| Utc::now().timestamp_millis());
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(ContestWindow::default().resolve(), None);
        assert_eq!(ContestWindow::new(None, Some(10)).resolve(), None);
        assert_eq!(ContestWindow::new(Some(5), Some(15)).resolve(), Some((5, 15)));

        let (start, end) = ContestWindow::new(Some(5), None).resolve().unwrap();
        assert_eq!(start, 5);
        assert!(end > 5);
    }
}
