//! Error taxonomy for the siaksim portal.

use thiserror::Error;

/// Application errors surfaced by the portal.
///
/// Only the first four are genuine application errors. Simulated overloads
/// and forced re-authentications are fabricated responses produced by the
/// fault injector and never travel through this type: to the end user they
/// must be indistinguishable from real upstream failures.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Protected page hit without a valid session. Handled as a redirect
    /// to the login page, not an error response.
    #[error("anonymous access to a protected page")]
    AnonymousAccess,

    /// Auth-marker cookie disagrees with the session's embedded id.
    /// Treated as tampering and logged as a security event.
    #[error("auth marker does not match session identity")]
    SessionIdentityMismatch,

    /// Password verification failed at `/start`.
    #[error("wrong password")]
    InvalidCredentials,

    /// CAPTCHA verification service rejected the response token.
    #[error("CAPTCHA rejected: {0}")]
    CaptchaRejected(String),

    /// Malformed or missing request fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence failure.
    #[error("database error: {0}")]
    Database(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            // Expected anonymous traffic redirects rather than erroring;
            // the 303 here is what the transport adapter emits.
            Self::AnonymousAccess => 303,
            Self::SessionIdentityMismatch => 401,
            Self::InvalidCredentials => 400,
            Self::CaptchaRejected(_) => 400,
            Self::InvalidInput(_) => 400,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// True for errors that should be logged as security events.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Self::SessionIdentityMismatch)
    }
}
