//! Student pages: home, level catalog, statistics.

use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Response},
};

use super::{api_alert, chrome};
use crate::api::teacher::Notice;
use crate::api::user::TopicScore;
use crate::auth::AuthContext;
use crate::domain::{Level, Role, LEVELS};
use crate::error::LogOnError;
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;

/// Notices shown on the home page
const HOME_NOTICE_COUNT: usize = 3;

#[derive(Template)]
#[template(path = "student_home.html")]
pub struct StudentHomeTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub name: String,
  pub level: Option<String>,
  pub page: Option<u32>,
  pub notices: Vec<Notice>,
}

pub struct LevelView {
  pub level: &'static Level,
  pub current: bool,
}

#[derive(Template)]
#[template(path = "level_select.html")]
pub struct LevelSelectTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub levels: Vec<LevelView>,
}

pub struct TopicRow {
  pub name: String,
  pub score: i64,
  /// Bar width in percent
  pub width: i64,
}

impl From<&TopicScore> for TopicRow {
  fn from(topic: &TopicScore) -> Self {
    let score = topic.score.round() as i64;
    Self {
      name: topic.name.clone(),
      score,
      width: score.clamp(0, 100),
    }
  }
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub name: String,
  pub total_learned: u32,
  pub goal: Option<u32>,
  pub topics: Vec<TopicRow>,
}

/// GET /student_home
pub async fn student_home(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }
  let (nav, alert) = chrome(&state, &auth, "/student_home");
  let credentials = auth.credentials();

  let progress = state
    .api
    .current_progress(&auth.user.user_id, &credentials)
    .await
    .log_warn("Progress fetch failed");
  let mut notices = state
    .api
    .notices(&credentials)
    .await
    .log_warn_default("Notice fetch failed");
  notices.truncate(HOME_NOTICE_COUNT);

  let template = StudentHomeTemplate {
    nav,
    alert,
    name: auth.user.name.clone(),
    level: progress.as_ref().map(|p| p.level.clone()),
    page: progress.map(|p| p.current_page),
    notices,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// GET /level_select
pub async fn level_select(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }
  let (nav, alert) = chrome(&state, &auth, "/level_select");
  let current = auth.user.level.as_deref();
  let levels = LEVELS
    .iter()
    .map(|level| LevelView {
      level,
      current: current == Some(level.id),
    })
    .collect();

  let template = LevelSelectTemplate { nav, alert, levels };
  Html(template.render().unwrap_or_default()).into_response()
}

/// GET /stats
pub async fn stats(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }
  let (nav, mut alert) = chrome(&state, &auth, "/stats");

  let stats = match state.api.stats(&auth.user.user_id, &auth.credentials()).await {
    Ok(stats) => stats,
    Err(e) => {
      alert = Some(api_alert(&e, "Stats fetch failed"));
      Default::default()
    }
  };

  let template = StatsTemplate {
    nav,
    alert,
    name: if stats.name.is_empty() {
      auth.user.name.clone()
    } else {
      stats.name.clone()
    },
    total_learned: stats.total_learned,
    goal: stats.goal,
    topics: stats.chart_data.iter().map(TopicRow::from).collect(),
  };
  Html(template.render().unwrap_or_default()).into_response()
}
