//! Shared constants for the siaksim portal.

/// Primary session cookie. Signed; carries the base64-JSON session payload.
pub const RUN_COOKIE: &str = "run";

/// Authentication marker cookie. Signed; bound to the session id.
pub const AUTH_MARKER_COOKIE: &str = "Mojavi";

/// Legacy compatibility marker cookie. Signed; constant value, the real
/// portal sets it and nothing ever reads it.
pub const LEGACY_COOKIE: &str = "siakng_cc";

/// Value of the legacy marker cookie.
pub const LEGACY_COOKIE_VALUE: &str = "noOneCaresAboutThisOneLOL";

/// Presence-only cookie flagging an automated run.
pub const BOT_COOKIE: &str = "X-BOT";

/// Path prefix gated by session + fault injection.
pub const PROTECTED_PREFIX: &str = "/main/";

/// Authentication section prefix. Requests here skip the forced-reauth
/// fault and the auth-marker requirement.
pub const AUTH_PREFIX: &str = "/main/Authentication/";

/// Landing page for forced re-authentication redirects.
pub const AUTH_PAGE: &str = "/main/Authentication/";

/// Plan editor, target of `ChangeRole`.
pub const PLAN_EDIT_PAGE: &str = "/main/CoursePlan/CoursePlanEdit";

/// Completion page.
pub const PLAN_DONE_PAGE: &str = "/main/CoursePlan/CoursePlanDone";

/// Marker in the plan-editor page where the CAPTCHA widget is spliced.
pub const CAPTCHA_MARKER: &str = "<!--CAPTCHA-->";

/// Marker in the leaderboard page where ranked rows are spliced.
pub const LEADERBOARD_MARKER: &str = "<!--LEADERBOARD-->";

/// Placeholder in the finish page replaced by the stored elapsed time.
pub const TIME_PLACEHOLDER: &str = "XXXX";

/// Maximum rows returned by either leaderboard.
pub const LEADERBOARD_LIMIT: i64 = 50;

/// Minimum accepted password length at `/start`.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:siaksim.db";
