//! System dashboard for administrators.

use askama::Template;
use axum::{
  extract::{Path, State},
  response::{Html, IntoResponse, Response},
};

use super::{api_alert, chrome, flash_redirect};
use crate::api::teacher::PendingTeacher;
use crate::auth::AuthContext;
use crate::domain::Role;
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "system_dash.html")]
pub struct SystemDashTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub pending: Vec<PendingTeacher>,
}

/// GET /system_dash
pub async fn system_dash(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Admin]) {
    return response;
  }
  let (nav, mut alert) = chrome(&state, &auth, "/system_dash");
  let pending = match state.api.pending_teachers(&auth.credentials()).await {
    Ok(pending) => pending,
    Err(e) => {
      alert = Some(api_alert(&e, "Pending teacher fetch failed"));
      Vec::new()
    }
  };
  let template = SystemDashTemplate { nav, alert, pending };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /system_dash/approve/{uid}
pub async fn approve_teacher(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(uid): Path<String>,
) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Admin]) {
    return response;
  }
  let alert = match state.api.approve_teacher(&uid, &auth.credentials()).await {
    Ok(()) => {
      tracing::info!("{} approved teacher {}", auth.user.user_id, uid);
      Alert::success(format!("{} can now sign in.", uid))
    }
    Err(e) => api_alert(&e, "Teacher approval failed"),
  };
  flash_redirect(&state, &auth, alert, "/system_dash")
}
