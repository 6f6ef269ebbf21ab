//! Navigation gate for the protected `/main/` subtree.
//!
//! Runs before fault injection so access control stays deterministic: a
//! request is allowed, bounced to login, bounced to the authentication
//! page, or rejected outright for identity tampering. On success the
//! verified session context is attached to the request for the injector
//! and the handlers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use siaksim_common::PortalError;
use siaksim_common::constants::{AUTH_PAGE, AUTH_PREFIX};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::session::SessionCookies;
use crate::state::AppState;

pub async fn check(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookies = SessionCookies::from_headers(req.headers(), &state.codec);
    let path = req.uri().path().to_string();

    let Some(session) = cookies.session.clone() else {
        debug!(path, "anonymous request to protected page");
        return AppError::from(PortalError::AnonymousAccess).into_response();
    };

    // An auth marker that disagrees with the session id is tampering,
    // wherever it shows up.
    if let Some(marker) = &cookies.auth_marker {
        if *marker != session.session_id.to_string() {
            warn!(
                path,
                name = %session.name,
                "auth marker does not match session id"
            );
            return AppError::from(PortalError::SessionIdentityMismatch).into_response();
        }
    }

    // Past the authentication step both markers must be present.
    if !path.starts_with(AUTH_PREFIX)
        && (cookies.auth_marker.is_none() || cookies.legacy_marker.is_none())
    {
        return Redirect::to(AUTH_PAGE).into_response();
    }

    req.extensions_mut().insert(session);
    req.extensions_mut().insert(cookies);
    next.run(req).await
}
