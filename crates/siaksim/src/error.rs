//! Transport adapter for the portal error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use siaksim_common::PortalError;

/// Newtype giving [`PortalError`] an HTTP rendering.
#[derive(Debug)]
pub struct AppError(pub PortalError);

impl From<PortalError> for AppError {
    fn from(err: PortalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_security_event() {
            tracing::warn!(error = %self.0, "security event");
        }
        match &self.0 {
            // Expected anonymous traffic, not an error page.
            PortalError::AnonymousAccess => Redirect::to("/").into_response(),
            err => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.to_string()).into_response()
            }
        }
    }
}
