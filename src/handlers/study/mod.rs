//! Study handlers for the vocabulary flow.
//!
//! The session lives in the session store; every POST action applies one
//! state-machine step and redirects back to the page.

mod actions;
mod page;
mod templates;

use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::AuthContext;
use crate::session::Alert;
use crate::state::AppState;
use crate::study::StudyError;

// Re-export public items
pub use actions::{
  evaluate, flip, next, previous, quiz_answer, quiz_start, record_start, record_stop, retry,
};
pub use page::{review_start, vocabulary};
pub use templates::{
  AnswerForm, CardView, CompletionView, EvaluationView, MicForm, QuizView, VocabularyQuery,
  VocabularyTemplate,
};

pub(crate) const STUDY_PATH: &str = "/study/vocabulary";

pub(crate) fn back_to_study() -> Response {
  Redirect::to(STUDY_PATH).into_response()
}

/// No live session (expired, or never started)
pub(crate) fn back_to_levels() -> Response {
  Redirect::to("/level_select").into_response()
}

pub(crate) fn flash_study_error(state: &AppState, auth: &AuthContext, error: &StudyError) {
  tracing::debug!("{}: study action refused: {}", auth.user.user_id, error);
  auth.flash(state, Alert::for_class(error.class(), error.user_message()));
}
