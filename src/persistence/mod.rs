//! Persistence Layer
//!
//! Two durable artifacts back the service:
//! - the snapshot log, an append-only NDJSON history of per-user totals
//! - the leaderboard cache file, the last committed live leaderboard

pub mod leaderboard_file;
pub mod snapshot_log;

pub use leaderboard_file::{load_leaderboard, save_leaderboard};
pub use snapshot_log::{parse_log, SnapshotStore};
