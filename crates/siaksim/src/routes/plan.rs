//! Course-plan editor, submission, and completion handlers.

use std::collections::BTreeMap;

use axum::{
    Extension, Form,
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use siaksim_common::constants::PLAN_DONE_PAGE;
use siaksim_common::{PortalError, Session};
use tracing::info;

use crate::error::AppError;
use crate::faults::PlanPage;
use crate::session::SessionCookies;
use crate::state::AppState;

/// Plan editor. Which of the three pages you get is a profile-weighted
/// draw; humans additionally get the CAPTCHA widget spliced in.
pub async fn edit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let page = match state.injector.plan_page_draw(session.is_bot) {
        PlanPage::Success => {
            if session.is_bot {
                state.pages.plan.clone()
            } else {
                state.pages.plan_with_captcha(&state.config.captcha.site_key)
            }
        }
        PlanPage::Error => state.pages.plan_error.clone(),
        PlanPage::Empty => state.pages.plan_empty.clone(),
    };
    Html(page)
}

/// Submit the plan: CAPTCHA for humans, then persist elapsed time and the
/// serialized body, carrying the improved verdict to the done page.
pub async fn save(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(cookies): Extension<SessionCookies>,
    headers: HeaderMap,
    Form(body): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    // The gate already matched the marker, but submission is where the
    // run is scored, so the identity binding is rechecked here.
    if cookies.auth_marker.as_deref() != Some(session.session_id.to_string().as_str()) {
        return Err(PortalError::SessionIdentityMismatch.into());
    }

    if !session.is_bot {
        let token = body
            .get("cf-turnstile-response")
            .ok_or_else(|| PortalError::CaptchaRejected("missing response token".into()))?;
        state.captcha.verify(token, &client_ip(&headers)).await?;
    }

    let elapsed = session.elapsed_ms();
    let serialized = serde_json::to_string(&body)
        .map_err(|e| PortalError::Internal(format!("body encode: {e}")))?;
    let improved = state
        .store
        .record_run(&session.name, &serialized, elapsed, session.is_bot)
        .await?;

    info!(
        name = %session.name,
        elapsed_ms = elapsed,
        improved,
        is_bot = session.is_bot,
        "plan submitted"
    );

    Ok(Redirect::to(&format!("{PLAN_DONE_PAGE}?better={}", u8::from(improved))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct DoneQuery {
    pub better: Option<String>,
}

/// Completion page, rendered from the persisted record rather than the
/// session.
pub async fn done(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<DoneQuery>,
) -> Result<Response, AppError> {
    let Some(record) = state.store.find_by_name(&session.name).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    let improved = query.better.as_deref() != Some("0");
    Ok(Html(state.pages.render_finish(record.time_elapsed, improved)).into_response())
}

/// Class schedule page.
pub async fn schedule(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.schedule.clone())
}

/// Caller address for CAPTCHA verification: first hop of
/// `X-Forwarded-For`, else loopback.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
