//! Core types shared across the siaksim portal.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logged-in run, held entirely in a signed client-side cookie.
///
/// Never persisted server-side: the cookie *is* the session store. The
/// session is invalid the moment the cookie is absent, malformed, or its
/// signature fails to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Fresh random id minted at login; the auth-marker cookie must carry
    /// this exact value for protected pages past the authentication step.
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,

    /// User name, also the persistence key.
    pub name: String,

    /// Run start, epoch milliseconds. Immutable for the cookie's lifetime;
    /// the competitive metric is `now - start_time` at plan submission.
    #[serde(rename = "startTime")]
    pub start_time: i64,

    /// Automated run: alternate fault profile, no CAPTCHA.
    #[serde(rename = "isBot")]
    pub is_bot: bool,
}

impl Session {
    /// Mint a session for a fresh run starting now.
    pub fn start(name: String, is_bot: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            name,
            start_time: Utc::now().timestamp_millis(),
            is_bot,
        }
    }

    /// Milliseconds elapsed since the run started.
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now().timestamp_millis() - self.start_time
    }
}

/// A row of the `records` table, keyed by unique `name`.
///
/// Created at first login attempt for a name (login and register are the
/// same operation); mutated only by plan submission; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
    /// Milliseconds for the best recorded run, `None` until a first
    /// submission lands.
    pub time_elapsed: Option<i64>,
    /// Serialized course-plan form body from the latest submission.
    pub submitted_body: Option<String>,
    /// 0 = human, 1 = bot. Stored as an integer to match the table.
    pub is_bot: i64,
}

/// One leaderboard row as rendered: rank is positional, fastest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub name: String,
    pub time_elapsed: i64,
}

/// What the fault injector decided for a single request.
///
/// Computed fresh per request, logged, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultDecision {
    /// Injected upstream latency actually slept, in milliseconds.
    pub delay_ms: u64,
    /// An overload error page was fabricated.
    pub injected_error: bool,
    /// The fabricated error went out with HTTP 200 instead of 502.
    pub wrong_status: bool,
    /// The request was bounced back to the authentication page.
    pub forced_reauth: bool,
    /// Which of the two overload pages was served (0 or 1).
    pub error_page: Option<u8>,
}

impl FaultDecision {
    /// True when the request passed through unmodified.
    pub fn is_clean(&self) -> bool {
        !self.injected_error && !self.forced_reauth
    }
}
