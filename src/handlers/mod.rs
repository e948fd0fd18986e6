pub mod account;
pub mod admin;
pub mod notices;
pub mod student;
pub mod study;
pub mod teacher;

use askama::Template;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::auth::{AuthContext, OptionalAuth};
use crate::error::ApiError;
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub nav: NavContext,
  pub version: &'static str,
}

/// Navigation plus the pending flash alert for a page render
pub(crate) fn chrome(state: &AppState, auth: &AuthContext, path: &str) -> (NavContext, Option<Alert>) {
  (auth.nav(path), auth.take_flash(state))
}

/// Log a failed backend call and turn it into an alert for the page
pub(crate) fn api_alert(error: &ApiError, context: &str) -> Alert {
  error.log(context);
  Alert::for_class(error.class(), error.user_message())
}

/// Queue an alert and redirect, the usual ending of a form POST
pub(crate) fn flash_redirect(state: &AppState, auth: &AuthContext, alert: Alert, to: &str) -> Response {
  auth.flash(state, alert);
  Redirect::to(to).into_response()
}

/// GET / - Landing page; signed-in users go straight to their home
pub async fn index(OptionalAuth(auth): OptionalAuth) -> Response {
  if let Some(auth) = auth {
    return Redirect::to(auth.user.role.landing_path()).into_response();
  }
  let template = IndexTemplate {
    nav: NavContext::hidden(),
    version: env!("CARGO_PKG_VERSION"),
  };
  Html(template.render().unwrap_or_default()).into_response()
}

pub use account::{
  change_password, profile_page, settings_page, update_profile, update_settings, withdraw,
};
pub use admin::{approve_teacher, system_dash};
pub use notices::notices;
pub use student::{level_select, stats, student_home};
pub use teacher::{reset_student_password, send_notice, teacher_dash, teacher_student};
