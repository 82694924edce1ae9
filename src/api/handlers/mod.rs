pub mod admin;
pub mod leaderboard;

pub use admin::*;
pub use leaderboard::*;
