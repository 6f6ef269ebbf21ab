//! Ranked listings of finished runs.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;
use crate::state::AppState;

/// Human leaderboard, fastest first.
pub async fn humans(State(state): State<AppState>) -> Result<Response, AppError> {
    render(state, false).await
}

/// Bot leaderboard, same template, different filter.
pub async fn bots(State(state): State<AppState>) -> Result<Response, AppError> {
    render(state, true).await
}

async fn render(state: AppState, bots: bool) -> Result<Response, AppError> {
    let rows = state.store.leaderboard(bots).await?;
    Ok(Html(state.pages.render_leaderboard(&rows)).into_response())
}
