//! HTTP route handlers for the portal.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{faults, gate, state::AppState};

mod auth;
mod leaderboard;
mod plan;

/// Create the main application router. Everything under `/main/` passes
/// the navigation gate first, then the fault injector; public routes see
/// neither.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/main/Authentication/", get(auth::auth_page))
        .route("/main/Authentication/Index", post(auth::auth_index))
        .route("/main/Authentication/ChangeRole", get(auth::change_role))
        .route("/main/CoursePlan/CoursePlanEdit", get(plan::edit))
        .route("/main/CoursePlan/CoursePlanSave", post(plan::save))
        .route("/main/CoursePlan/CoursePlanDone", get(plan::done))
        .route("/main/Schedule/Index", get(plan::schedule))
        // Layer order: the gate is outermost so access control stays
        // deterministic and untouched by randomized faults.
        .layer(middleware::from_fn_with_state(state.clone(), faults::inject))
        .layer(middleware::from_fn_with_state(state.clone(), gate::check));

    Router::new()
        .route("/", get(auth::index))
        .route("/start", post(auth::start))
        .route("/leaderboard", get(leaderboard::humans))
        .route("/leaderboard/bot", get(leaderboard::bots))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
