//! Login and the authentication-step handlers.

use axum::{
    Extension, Form,
    extract::State,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use siaksim_common::constants::{
    AUTH_MARKER_COOKIE, AUTH_PAGE, BOT_COOKIE, LEGACY_COOKIE, LEGACY_COOKIE_VALUE,
    MIN_PASSWORD_LEN, PLAN_EDIT_PAGE, RUN_COOKIE,
};
use siaksim_common::{PortalError, Session};
use tracing::info;

use crate::error::AppError;
use crate::password;
use crate::session::{clear_cookie, set_cookie};
use crate::state::AppState;

/// Landing/login page.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.index.clone())
}

#[derive(Debug, Deserialize)]
pub struct StartForm {
    pub name: String,
    pub password: String,
    /// Any non-empty value flags an automated run.
    #[serde(default)]
    pub is_bot_run: Option<String>,
}

/// Register-or-login. First use of a name sets its password; later uses
/// must match it. On success the run starts: a fresh session cookie with
/// the clock already ticking.
pub async fn start(
    State(state): State<AppState>,
    Form(form): Form<StartForm>,
) -> Result<Response, AppError> {
    if form.name.is_empty() {
        return Err(PortalError::InvalidInput("name must not be empty".into()).into());
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        return Err(PortalError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    let record = match state.store.find_by_name(&form.name).await? {
        Some(record) => record,
        None => {
            state
                .store
                .create(&form.name, &password::hash(&form.password))
                .await?;
            info!(name = %form.name, "registered new participant");
            state
                .store
                .find_by_name(&form.name)
                .await?
                .ok_or_else(|| PortalError::Internal("record vanished after insert".into()))?
        }
    };

    if !password::verify(&form.password, &record.password_hash) {
        return Err(PortalError::InvalidCredentials.into());
    }

    let is_bot = form.is_bot_run.as_deref().is_some_and(|v| !v.is_empty());
    let session = Session::start(form.name.clone(), is_bot);
    let token = state.codec.encode(
        &serde_json::to_string(&session)
            .map_err(|e| PortalError::Internal(format!("session encode: {e}")))?,
    );

    info!(name = %form.name, is_bot, "run started");

    let mut res = Redirect::to(AUTH_PAGE).into_response();
    res.headers_mut()
        .append(SET_COOKIE, set_cookie(RUN_COOKIE, &token));
    // Markers from a finished run belong to the old session id; leaving
    // them around would trip the gate's tamper check on the next run.
    res.headers_mut()
        .append(SET_COOKIE, clear_cookie(AUTH_MARKER_COOKIE));
    res.headers_mut()
        .append(SET_COOKIE, clear_cookie(LEGACY_COOKIE));
    if is_bot {
        res.headers_mut()
            .append(SET_COOKIE, set_cookie(BOT_COOKIE, "1"));
    } else {
        res.headers_mut()
            .append(SET_COOKIE, clear_cookie(BOT_COOKIE));
    }
    Ok(res)
}

/// The authentication page itself. Viewing it issues nothing.
pub async fn auth_page(State(state): State<AppState>) -> Html<String> {
    Html(state.pages.auth.clone())
}

/// Explicit submission of the authentication form: issues the auth marker
/// (bound to the session id) and the legacy marker.
pub async fn auth_index(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    let marker = state.codec.encode(&session.session_id.to_string());
    let legacy = state.codec.encode(LEGACY_COOKIE_VALUE);

    let mut res = Html(state.pages.auth_done.clone()).into_response();
    res.headers_mut()
        .append(SET_COOKIE, set_cookie(AUTH_MARKER_COOKIE, &marker));
    res.headers_mut()
        .append(SET_COOKIE, set_cookie(LEGACY_COOKIE, &legacy));
    res
}

/// The portal makes you "change role" before you may touch the plan.
pub async fn change_role() -> Redirect {
    Redirect::to(PLAN_EDIT_PAGE)
}
