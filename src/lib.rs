pub mod adapters;
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod services;

pub use adapters::{FetchClient, ReqwestTransport, TransportResponse, UpstreamTransport};
pub use bootstrap::Services;
pub use config::AppConfig;
pub use domain::{ContestWindow, LiveLeaderboard, PlayerRecord, Snapshot};
pub use error::{FetchErrorKind, LeaderboardError, Result};
pub use persistence::SnapshotStore;
pub use services::{
    compute_window_gains, CycleOutcome, LiveState, RankedSource, RefreshPhase, Refresher,
    WindowedGainCalculator,
};
