//! Admin endpoints, gated by the shared secret.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use tracing::info;

use crate::api::{auth::ensure_admin_authorized, state::AppState, types::*};
use crate::domain::ContestWindow;

/// POST /api/admin/window -- set or clear (both bounds null) the contest window
pub async fn set_contest_window(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetWindowRequest>,
) -> std::result::Result<Json<ContestWindow>, (StatusCode, String)> {
    ensure_admin_authorized(&headers, &state.admin)?;

    if let (Some(start), Some(end)) = (req.start, req.end) {
        if start > end {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("window start {} is after end {}", start, end),
            ));
        }
    }

    let window = ContestWindow::new(req.start, req.end);
    state.live.set_contest_window(window).await;
    if window.is_active() {
        info!("Contest window set to {:?}", window);
    } else {
        info!("Contest window cleared, serving the live leaderboard");
    }
    Ok(Json(window))
}

/// POST /api/admin/countdown -- set or clear the freeze deadline
pub async fn set_countdown(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetCountdownRequest>,
) -> std::result::Result<Json<LeaderboardMeta>, (StatusCode, String)> {
    ensure_admin_authorized(&headers, &state.admin)?;

    state.live.set_countdown(req.deadline).await;
    info!("Countdown deadline set to {:?}", req.deadline);

    let board = state.live.leaderboard().await;
    Ok(Json(LeaderboardMeta {
        updated_at: board.updated_at,
        count: board.len(),
        window: state.live.contest_window().await,
        countdown: req.deadline,
        frozen: state.live.is_frozen(chrono::Utc::now()).await,
        phase: state.refresher.phase(),
    }))
}

/// POST /api/admin/refresh -- run one refresh cycle now
pub async fn force_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> std::result::Result<Json<RefreshResponse>, (StatusCode, String)> {
    ensure_admin_authorized(&headers, &state.admin)?;

    let outcome = state.refresher.run_cycle().await;
    info!("Forced refresh finished: {:?}", outcome);
    Ok(Json(RefreshResponse {
        outcome,
        updated_at: state.live.leaderboard().await.updated_at,
    }))
}
