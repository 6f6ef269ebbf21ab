//! Fault injection: the simulated unreliability of the upstream portal.
//!
//! Every request under `/main/` that survives the navigation gate runs
//! through [`FaultInjector::simulate`], which may sleep, fabricate an
//! overload page, or bounce the caller back to the authentication step.
//! All randomness flows through an injected [`RandomSource`] so tests can
//! pin exact fault sequences.

use std::sync::Mutex;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;
use siaksim_common::FaultDecision;
use siaksim_common::constants::{AUTH_PAGE, AUTH_PREFIX};
use tracing::info;

use crate::config::FaultConfig;
use crate::pages::overload_file_name;
use crate::session::SessionCookies;
use crate::state::AppState;

/// Probability table for one class of session.
#[derive(Debug, Clone, Deserialize)]
pub struct FaultProfile {
    /// Upper bound for the uniform latency draw, milliseconds.
    pub delay_ceiling_ms: u64,
    /// Chance a request survives the overload check.
    pub continue_probability: f64,
    /// Chance a fabricated overload masquerades as HTTP 200.
    pub wrong_status_probability: f64,
    /// Chance of a forced re-authentication redirect.
    pub deauth_probability: f64,
    /// Plan-editor draw: chance of the working editor page.
    pub plan_success_probability: f64,
    /// Plan-editor draw: chance of the error page (remainder is empty).
    pub plan_error_probability: f64,
}

impl FaultProfile {
    /// The authentic experience. Four out of five requests hit an
    /// overload, and half the survivors get logged out anyway.
    pub fn human() -> Self {
        Self {
            delay_ceiling_ms: 5000,
            continue_probability: 0.2,
            wrong_status_probability: 0.5,
            deauth_probability: 0.5,
            plan_success_probability: 0.33,
            plan_error_probability: 0.33,
        }
    }

    /// Milder table for automated runs so bot leaderboard entries finish
    /// in bounded time.
    pub fn bot() -> Self {
        Self {
            delay_ceiling_ms: 1000,
            continue_probability: 0.5,
            wrong_status_probability: 0.5,
            deauth_probability: 0.25,
            plan_success_probability: 0.5,
            plan_error_probability: 0.25,
        }
    }
}

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Process-wide thread RNG, the production source.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic source for tests.
pub struct SeededRandom(Mutex<StdRng>);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.0.lock().expect("RNG lock poisoned").random::<f64>()
    }
}

/// Fabricated response chosen by the injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Serve an overload page, with its 0/1 id and optionally a lying
    /// 200 status instead of 502.
    Overload { page: u8, wrong_status: bool },
    /// Bounce the caller back to the authentication page.
    Reauth,
}

/// Outcome of the plan-editor three-way draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPage {
    Success,
    Error,
    Empty,
}

/// Per-request fault decision maker.
pub struct FaultInjector {
    enabled: bool,
    human: FaultProfile,
    bot: FaultProfile,
    rng: Box<dyn RandomSource>,
}

impl FaultInjector {
    pub fn new(config: &FaultConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            enabled: config.enabled,
            human: config.human.clone(),
            bot: config.bot.clone(),
            rng,
        }
    }

    fn profile(&self, is_bot: bool) -> &FaultProfile {
        if is_bot { &self.bot } else { &self.human }
    }

    /// Decide the fate of one request. Sleeps for the drawn latency before
    /// any error/redirect evaluation; returns the fabricated fault (if
    /// any) plus the full decision for logging.
    pub async fn simulate(
        &self,
        path: &str,
        cookies: &SessionCookies,
    ) -> (Option<Fault>, FaultDecision) {
        let mut decision = FaultDecision::default();

        if !self.enabled {
            return (None, decision);
        }

        let is_bot = cookies.session.as_ref().is_some_and(|s| s.is_bot);
        let profile = self.profile(is_bot);

        // Upstream latency, drawn and slept unconditionally.
        let delay_ms = (self.rng.next_f64() * profile.delay_ceiling_ms as f64) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        decision.delay_ms = delay_ms;

        // Overload: the server "gives up" on most requests.
        if self.rng.next_f64() >= profile.continue_probability {
            decision.injected_error = true;
            decision.wrong_status = self.rng.next_f64() < profile.wrong_status_probability;
            let page = if self.rng.next_f64() < 0.5 { 0 } else { 1 };
            decision.error_page = Some(page);
            return (
                Some(Fault::Overload {
                    page,
                    wrong_status: decision.wrong_status,
                }),
                decision,
            );
        }

        // Forced re-authentication, except on the authentication pages
        // themselves. A missing auth marker always bounces.
        if !path.starts_with(AUTH_PREFIX) {
            let reauth =
                cookies.auth_marker.is_none() || self.rng.next_f64() < profile.deauth_probability;
            decision.forced_reauth = reauth;
            if reauth {
                return (Some(Fault::Reauth), decision);
            }
        }

        (None, decision)
    }

    /// The plan editor's three-way outcome. With faults disabled the
    /// working editor is guaranteed.
    pub fn plan_page_draw(&self, is_bot: bool) -> PlanPage {
        if !self.enabled {
            return PlanPage::Success;
        }
        let profile = self.profile(is_bot);
        let val = self.rng.next_f64();
        if val < profile.plan_success_probability {
            PlanPage::Success
        } else if val < profile.plan_success_probability + profile.plan_error_probability {
            PlanPage::Error
        } else {
            PlanPage::Empty
        }
    }

    /// One log line per invocation. Override mode keeps operational logs
    /// noise-free on purpose.
    pub fn log_decision(&self, method: &Method, path: &str, decision: &FaultDecision) {
        if !self.enabled {
            info!(method = %method, path, "Normal");
            return;
        }
        info!(
            method = %method,
            path,
            faked_error = decision.injected_error,
            wrong_status = decision.wrong_status,
            error_page = decision
                .error_page
                .map(overload_file_name)
                .unwrap_or_else(|| "Not an error".to_string()),
            reauth = decision.forced_reauth,
            delay_ms = decision.delay_ms,
            "simulated"
        );
    }
}

/// Middleware applying the injector to the protected subtree. Runs after
/// the navigation gate, so a session is already attached.
pub async fn inject(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let cookies = req
        .extensions()
        .get::<SessionCookies>()
        .cloned()
        .unwrap_or_default();

    let (fault, decision) = state.injector.simulate(&path, &cookies).await;
    state.injector.log_decision(&method, &path, &decision);

    match fault {
        Some(Fault::Overload { page, wrong_status }) => {
            let status = if wrong_status {
                StatusCode::OK
            } else {
                StatusCode::BAD_GATEWAY
            };
            (status, Html(state.pages.overload(page).to_string())).into_response()
        }
        Some(Fault::Reauth) => Redirect::to(AUTH_PAGE).into_response(),
        None => next.run(req).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siaksim_common::Session;

    fn injector(enabled: bool, profile: FaultProfile) -> FaultInjector {
        let config = FaultConfig {
            enabled,
            human: profile.clone(),
            bot: profile,
        };
        FaultInjector::new(&config, Box::new(SeededRandom::new(42)))
    }

    fn instant_profile() -> FaultProfile {
        FaultProfile {
            delay_ceiling_ms: 0,
            ..FaultProfile::human()
        }
    }

    fn cookies_with_marker() -> SessionCookies {
        let session = Session::start("alice".into(), false);
        SessionCookies {
            auth_marker: Some(session.session_id.to_string()),
            legacy_marker: Some("x".into()),
            session: Some(session),
        }
    }

    #[tokio::test]
    async fn disabled_injector_is_a_no_op() {
        let injector = injector(false, FaultProfile::human());
        for _ in 0..20 {
            let (fault, decision) = injector
                .simulate("/main/CoursePlan/CoursePlanEdit", &cookies_with_marker())
                .await;
            assert_eq!(fault, None);
            assert_eq!(decision, FaultDecision::default());
        }
        assert_eq!(injector.plan_page_draw(false), PlanPage::Success);
    }

    #[tokio::test]
    async fn overload_probability_one_always_fabricates() {
        let profile = FaultProfile {
            continue_probability: 0.0,
            wrong_status_probability: 1.0,
            ..instant_profile()
        };
        let injector = injector(true, profile);
        for _ in 0..20 {
            let (fault, decision) = injector
                .simulate("/main/Authentication/", &cookies_with_marker())
                .await;
            match fault {
                Some(Fault::Overload { page, wrong_status }) => {
                    assert!(wrong_status);
                    assert!(page <= 1);
                    assert_eq!(decision.error_page, Some(page));
                }
                other => panic!("expected overload, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn overload_probability_zero_never_fabricates() {
        let profile = FaultProfile {
            continue_probability: 1.0,
            deauth_probability: 0.0,
            ..instant_profile()
        };
        let injector = injector(true, profile);
        for _ in 0..20 {
            let (fault, _) = injector
                .simulate("/main/CoursePlan/CoursePlanEdit", &cookies_with_marker())
                .await;
            assert_eq!(fault, None);
        }
    }

    #[tokio::test]
    async fn deauth_fires_outside_auth_pages_only() {
        let profile = FaultProfile {
            continue_probability: 1.0,
            deauth_probability: 1.0,
            ..instant_profile()
        };
        let injector = injector(true, profile);

        let (fault, _) = injector
            .simulate("/main/CoursePlan/CoursePlanEdit", &cookies_with_marker())
            .await;
        assert_eq!(fault, Some(Fault::Reauth));

        let (fault, _) = injector
            .simulate("/main/Authentication/", &cookies_with_marker())
            .await;
        assert_eq!(fault, None);
    }

    #[tokio::test]
    async fn missing_auth_marker_always_forces_reauth() {
        let profile = FaultProfile {
            continue_probability: 1.0,
            deauth_probability: 0.0,
            ..instant_profile()
        };
        let injector = injector(true, profile);
        let cookies = SessionCookies {
            auth_marker: None,
            ..cookies_with_marker()
        };
        let (fault, decision) = injector
            .simulate("/main/CoursePlan/CoursePlanEdit", &cookies)
            .await;
        assert_eq!(fault, Some(Fault::Reauth));
        assert!(decision.forced_reauth);
    }

    #[tokio::test]
    async fn seeded_source_reproduces_the_same_fault_sequence() {
        let run = |seed: u64| async move {
            let config = FaultConfig {
                enabled: true,
                human: instant_profile(),
                bot: instant_profile(),
            };
            let injector = FaultInjector::new(&config, Box::new(SeededRandom::new(seed)));
            let mut sequence = Vec::new();
            for _ in 0..10 {
                let (fault, _) = injector
                    .simulate("/main/CoursePlan/CoursePlanEdit", &cookies_with_marker())
                    .await;
                sequence.push(fault);
            }
            sequence
        };
        assert_eq!(run(7).await, run(7).await);
    }

    #[test]
    fn plan_draw_respects_extreme_weights() {
        let always_success = FaultProfile {
            plan_success_probability: 1.0,
            plan_error_probability: 0.0,
            ..instant_profile()
        };
        let inj = injector(true, always_success);
        for _ in 0..20 {
            assert_eq!(inj.plan_page_draw(false), PlanPage::Success);
        }

        let always_empty = FaultProfile {
            plan_success_probability: 0.0,
            plan_error_probability: 0.0,
            ..instant_profile()
        };
        let inj = injector(true, always_empty);
        for _ in 0..20 {
            assert_eq!(inj.plan_page_draw(false), PlanPage::Empty);
        }
    }
}
