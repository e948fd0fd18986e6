use askama::Template;
use axum::{
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};

use super::templates::{VocabularyQuery, VocabularyTemplate};
use super::{back_to_levels, back_to_study, STUDY_PATH};
use crate::auth::AuthContext;
use crate::domain::level::find_level;
use crate::domain::word::to_study_items;
use crate::domain::Role;
use crate::error::LogOnError;
use crate::session::Alert;
use crate::state::AppState;
use crate::study::{Phase, StudyError, StudySession};

/// Level a fresh session should use when none was asked for
fn fallback_level(state: &AppState, auth: &AuthContext) -> String {
  auth
    .user
    .level
    .clone()
    .unwrap_or_else(|| state.config.study.default_level.clone())
}

fn store_session(state: &AppState, auth: &AuthContext, session: StudySession) {
  let level = session.level().to_string();
  state.sessions.with_study(&auth.session_id, |slot| *slot = Some(session));
  state
    .sessions
    .update_context(&auth.session_id, |context| context.level = Some(level));
}

/// Load words and quiz for `level` and replace the browser's study session
async fn start_session(state: &AppState, auth: &AuthContext, level: &str) -> Result<(), Response> {
  let credentials = auth.credentials();
  let records = match state.api.words(level, &auth.user.user_id, &credentials).await {
    Ok(records) => records,
    Err(e) => {
      e.log("Loading study words failed");
      auth.flash(state, Alert::for_class(e.class(), e.user_message()));
      return Err(back_to_levels());
    }
  };
  let quiz = state
    .api
    .quiz(level, &credentials)
    .await
    .log_warn_default("Quiz fetch failed, continuing without quiz");

  match StudySession::new(level, &auth.user.user_id, to_study_items(records), quiz, state.study_rules()) {
    Ok(session) => {
      tracing::info!(
        "{} started {} ({} words, {} quiz items)",
        auth.user.user_id,
        level,
        session.words().len(),
        session.quiz_items().len()
      );
      store_session(state, auth, session);
      Ok(())
    }
    Err(StudyError::NoItems) => {
      auth.flash(state, Alert::warning("There are no words to study for this level yet."));
      Err(back_to_levels())
    }
    Err(e) => {
      auth.flash(state, Alert::for_class(e.class(), e.user_message()));
      Err(back_to_levels())
    }
  }
}

fn render(state: &AppState, auth: &AuthContext, now: DateTime<Utc>) -> Response {
  let alert = auth.take_flash(state);
  let mut nav = auth.nav(STUDY_PATH);
  let page = state
    .sessions
    .with_study(&auth.session_id, |slot| {
      let session = slot.as_mut()?;
      session.tick(now);
      nav.level = Some(session.level().to_string());
      Some(VocabularyTemplate::build(session, nav, alert, now))
    })
    .flatten();

  match page {
    Some(template) => Html(template.render().unwrap_or_default()).into_response(),
    None => back_to_levels(),
  }
}

/// GET /study/vocabulary?level= - Show (and start if needed) the study flow
pub async fn vocabulary(
  State(state): State<AppState>,
  auth: AuthContext,
  Query(query): Query<VocabularyQuery>,
) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }

  let wanted = query.level.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
  if let Some(level) = &wanted {
    if find_level(level).is_none() {
      auth.flash(&state, Alert::warning(format!("Unknown level: {}", level)));
      return back_to_levels();
    }
  }

  let live = state
    .sessions
    .with_study(&auth.session_id, |slot| {
      slot.as_ref().map(|s| (s.level().to_string(), s.phase()))
    })
    .flatten();

  let start = match (&wanted, &live) {
    (_, None) => Some(wanted.clone().unwrap_or_else(|| fallback_level(&state, &auth))),
    (Some(level), Some((current, phase))) => {
      let fresh = query.restart.is_some() || level != current || *phase == Phase::Complete;
      fresh.then(|| level.clone())
    }
    (None, Some(_)) => None,
  };

  if let Some(level) = start {
    if let Err(response) = start_session(&state, &auth, &level).await {
      return response;
    }
    // Drop the query string so reloads resume instead of restarting
    if wanted.is_some() {
      return back_to_study();
    }
  }

  render(&state, &auth, Utc::now())
}

/// GET /study/review - Practise previously missed words only
pub async fn review_start(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }
  let credentials = auth.credentials();

  let level = match &auth.user.level {
    Some(level) => level.clone(),
    None => state
      .api
      .current_progress(&auth.user.user_id, &credentials)
      .await
      .log_warn("Progress fetch failed")
      .map(|p| p.level)
      .filter(|level| find_level(level).is_some())
      .unwrap_or_else(|| state.config.study.default_level.clone()),
  };

  let records = match state.api.review_words(&auth.user.user_id, &credentials).await {
    Ok(records) => records,
    Err(e) => {
      e.log("Loading review words failed");
      auth.flash(&state, Alert::for_class(e.class(), e.user_message()));
      return Redirect::to("/student_home").into_response();
    }
  };
  let quiz = state
    .api
    .quiz(&level, &credentials)
    .await
    .log_warn_default("Quiz fetch failed, continuing without quiz");

  match StudySession::review_only(
    &level,
    &auth.user.user_id,
    to_study_items(records),
    quiz,
    state.study_rules(),
    Utc::now(),
  ) {
    Ok(session) => {
      tracing::info!(
        "{} started a review of {} words",
        auth.user.user_id,
        session.review_items().len()
      );
      store_session(&state, &auth, session);
      back_to_study()
    }
    Err(_) => {
      auth.flash(&state, Alert::info("There are no words to review right now."));
      Redirect::to("/student_home").into_response()
    }
  }
}
