//! Cookie parsing and the per-request session context.
//!
//! Extracts the portal's four cookies from raw `Cookie` headers, runs the
//! signed ones through the [`TokenCodec`], and bundles the result so the
//! gate, the fault injector, and the handlers all see the same view.

use axum::http::{HeaderMap, HeaderValue, header};
use siaksim_common::Session;
use siaksim_common::constants::{AUTH_MARKER_COOKIE, LEGACY_COOKIE, RUN_COOKIE};

use crate::token::TokenCodec;

/// Everything the portal knows about a request from its cookies alone.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    /// Verified primary session, if the `run` cookie checked out.
    pub session: Option<Session>,
    /// Verified auth-marker value (a session id string).
    pub auth_marker: Option<String>,
    /// Verified legacy marker value.
    pub legacy_marker: Option<String>,
}

impl SessionCookies {
    /// Parse and verify all portal cookies. Anything malformed or with a
    /// bad signature is treated as absent.
    pub fn from_headers(headers: &HeaderMap, codec: &TokenCodec) -> Self {
        let session = raw_cookie(headers, RUN_COOKIE)
            .and_then(|v| codec.decode(&v))
            .and_then(|json| serde_json::from_str(&json).ok());

        Self {
            session,
            auth_marker: raw_cookie(headers, AUTH_MARKER_COOKIE).and_then(|v| codec.decode(&v)),
            legacy_marker: raw_cookie(headers, LEGACY_COOKIE).and_then(|v| codec.decode(&v)),
        }
    }
}

/// Find a cookie by name across all `Cookie` headers.
pub fn raw_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

/// Build a `Set-Cookie` value for a portal cookie.
pub fn set_cookie(name: &str, value: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax"))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Build a `Set-Cookie` value that expires a portal cookie.
pub fn clear_cookie(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}
