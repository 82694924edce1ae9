//! Persisted copy of the live leaderboard, restored on startup.

use std::path::Path;

use crate::domain::LiveLeaderboard;
use crate::error::{LeaderboardError, Result};

/// Load the persisted leaderboard. A missing file is `Ok(None)`.
pub async fn load_leaderboard(path: &Path) -> Result<Option<LiveLeaderboard>> {
    let s = match tokio::fs::read_to_string(path).await {
        Ok(v) => v,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LeaderboardError::Io(e)),
    };
    let board = serde_json::from_str(&s)?;
    Ok(Some(board))
}

/// Write the leaderboard via a sibling temp file and rename it into place.
pub async fn save_leaderboard(path: &Path, board: &LiveLeaderboard) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(LeaderboardError::Internal("invalid cache path".to_string()));
    };
    if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(board)?;
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
