//! Read endpoints. These never fail: the worst case is an empty `data`.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::{state::AppState, types::*};
use crate::domain::LiveLeaderboard;

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// GET /api/leaderboard -- full-history live leaderboard
pub async fn get_leaderboard(State(state): State<AppState>) -> Json<LiveLeaderboard> {
    let board = state.live.leaderboard().await;
    Json(board.as_ref().clone())
}

/// GET /api/leaderboard/contest -- gains inside the active contest window,
/// or the live leaderboard when no window is set
pub async fn get_contest_leaderboard(
    State(state): State<AppState>,
) -> Json<WindowedLeaderboardResponse> {
    let board = state.live.leaderboard().await;
    let window = state.live.contest_window().await;

    let Some((start, end)) = window.resolve() else {
        return Json(WindowedLeaderboardResponse {
            updated_at: board.updated_at,
            window: None,
            data: board.entries.clone(),
        });
    };

    let data = state.gains.compute_windowed(start, end).await;
    Json(WindowedLeaderboardResponse {
        updated_at: board.updated_at,
        window: Some(window),
        data,
    })
}

/// GET /api/leaderboard/window?start=&end= -- ad-hoc windowed query
pub async fn get_window_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Json<WindowedLeaderboardResponse> {
    let updated_at = state.live.leaderboard().await.updated_at;
    let Some((start, end)) = query.bounds() else {
        return Json(WindowedLeaderboardResponse {
            updated_at,
            window: None,
            data: Vec::new(),
        });
    };

    let data = state.gains.compute_windowed(start, end).await;
    Json(WindowedLeaderboardResponse {
        updated_at,
        window: Some(crate::domain::ContestWindow::new(Some(start), Some(end))),
        data,
    })
}

/// GET /api/leaderboard/meta
pub async fn get_leaderboard_meta(State(state): State<AppState>) -> Json<LeaderboardMeta> {
    let board = state.live.leaderboard().await;
    let countdown = state.live.countdown().await;
    Json(LeaderboardMeta {
        updated_at: board.updated_at,
        count: board.len(),
        window: state.live.contest_window().await,
        countdown,
        frozen: state.live.is_frozen(chrono::Utc::now()).await,
        phase: state.refresher.phase(),
    })
}
