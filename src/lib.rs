pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod nav;
pub mod session;
pub mod state;
pub mod study;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validation;

use axum::{
  extract::DefaultBodyLimit,
  routing::{get, post},
  Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::study as study_pages;
use crate::state::AppState;

/// Directory served under `/assets` (bundled audio, styles, scripts)
pub const ASSETS_DIR: &str = "assets";

/// Upper bound for an uploaded recording
const MAX_RECORDING_UPLOAD: usize = 10 * 1024 * 1024;

/// Build the portal router
pub fn app(state: AppState) -> Router {
  let study = Router::new()
    .route("/vocabulary", get(study_pages::vocabulary))
    .route("/vocabulary/flip", post(study_pages::flip))
    .route("/vocabulary/next", post(study_pages::next))
    .route("/vocabulary/prev", post(study_pages::previous))
    .route("/vocabulary/record/start", post(study_pages::record_start))
    .route(
      "/vocabulary/record/stop",
      post(study_pages::record_stop).layer(DefaultBodyLimit::max(MAX_RECORDING_UPLOAD)),
    )
    .route("/vocabulary/evaluate", post(study_pages::evaluate))
    .route("/vocabulary/retry", post(study_pages::retry))
    .route("/vocabulary/quiz/start", post(study_pages::quiz_start))
    .route("/vocabulary/quiz/answer", post(study_pages::quiz_answer))
    .route("/review", get(study_pages::review_start));

  Router::new()
    .route("/", get(handlers::index))
    // Auth routes
    .route("/login", get(auth::login_page).post(auth::login_submit))
    .route("/logout", get(auth::logout))
    .route("/signup", get(auth::signup_page).post(auth::signup_submit))
    .route("/signup/check-id", post(auth::signup_check_id))
    // Student
    .route("/student_home", get(handlers::student_home))
    .route("/level_select", get(handlers::level_select))
    .route("/stats", get(handlers::stats))
    .nest("/study", study)
    // Any role
    .route("/profile", get(handlers::profile_page).post(handlers::update_profile))
    .route("/settings", get(handlers::settings_page).post(handlers::update_settings))
    .route("/settings/password", post(handlers::change_password))
    .route("/settings/withdraw", post(handlers::withdraw))
    .route("/notices", get(handlers::notices))
    // Teacher and admin
    .route("/teacher_dash", get(handlers::teacher_dash))
    .route("/teacher_dash/notice", post(handlers::send_notice))
    .route("/teacher_student/{uid}", get(handlers::teacher_student))
    .route(
      "/teacher_student/{uid}/reset-password",
      post(handlers::reset_student_password),
    )
    .route("/system_dash", get(handlers::system_dash))
    .route("/system_dash/approve/{uid}", post(handlers::approve_teacher))
    .nest_service("/assets", ServeDir::new(ASSETS_DIR))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
