use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Response},
};

use super::{api_alert, chrome};
use crate::api::teacher::Notice;
use crate::auth::AuthContext;
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "notices.html")]
pub struct NoticesTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub notices: Vec<Notice>,
}

/// GET /notices - Newest first
pub async fn notices(State(state): State<AppState>, auth: AuthContext) -> Response {
  let (nav, mut alert) = chrome(&state, &auth, "/notices");
  let notices = match state.api.notices(&auth.credentials()).await {
    Ok(notices) => notices,
    Err(e) => {
      alert = Some(api_alert(&e, "Notice fetch failed"));
      Vec::new()
    }
  };
  let template = NoticesTemplate { nav, alert, notices };
  Html(template.render().unwrap_or_default()).into_response()
}
