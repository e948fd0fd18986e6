//! POST actions of the study flow. Each one redirects back to the page.

use axum::{
  extract::{Multipart, State},
  response::Response,
  Form,
};
use chrono::Utc;

use super::templates::{AnswerForm, MicForm};
use super::{back_to_levels, back_to_study, flash_study_error};
use crate::auth::AuthContext;
use crate::domain::evaluation::normalize;
use crate::domain::Role;
use crate::error::LogOnError;
use crate::session::Alert;
use crate::state::AppState;
use crate::study::{AudioClip, EvaluationOutcome, MicAccess, Step, StudyError, StudySession};

/// Field name of the uploaded recording
const AUDIO_FIELD: &str = "audio";

/// Apply one synchronous step to the live session
fn act<F>(state: &AppState, auth: &AuthContext, f: F) -> Response
where
  F: FnOnce(&mut StudySession) -> Result<(), StudyError>,
{
  if let Err(response) = auth.require(state, &[Role::Student]) {
    return response;
  }
  let now = Utc::now();
  let result = state
    .sessions
    .with_study(&auth.session_id, |slot| {
      slot.as_mut().map(|session| {
        session.tick(now);
        f(session)
      })
    })
    .flatten();

  match result {
    None => back_to_levels(),
    Some(Ok(())) => back_to_study(),
    Some(Err(e)) => {
      flash_study_error(state, auth, &e);
      back_to_study()
    }
  }
}

/// POST /study/vocabulary/flip
pub async fn flip(State(state): State<AppState>, auth: AuthContext) -> Response {
  act(&state, &auth, |session| session.flip())
}

/// POST /study/vocabulary/next
pub async fn next(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }
  let now = Utc::now();
  let step = state
    .sessions
    .with_study(&auth.session_id, |slot| {
      slot.as_mut().map(|session| {
        session.tick(now);
        (session.next(now), session.level().to_string())
      })
    })
    .flatten();

  match step {
    None => back_to_levels(),
    Some((Step::Completed, level)) => {
      tracing::info!("{} completed {}", auth.user.user_id, level);
      // Best effort: the learner sees the completion screen either way
      state
        .api
        .complete(&level, &auth.user.user_id, &auth.credentials())
        .await
        .log_warn("Completion notification failed");
      back_to_study()
    }
    Some((Step::Blocked, _)) => {
      auth.flash(&state, Alert::info("Finish this card before moving on."));
      back_to_study()
    }
    Some(_) => back_to_study(),
  }
}

/// POST /study/vocabulary/prev
pub async fn previous(State(state): State<AppState>, auth: AuthContext) -> Response {
  act(&state, &auth, |session| {
    session.previous();
    Ok(())
  })
}

/// POST /study/vocabulary/record/start - The browser reports the mic prompt outcome
pub async fn record_start(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<MicForm>,
) -> Response {
  let access = MicAccess::from_str(&form.mic);
  if access == MicAccess::Denied {
    tracing::warn!("{}: microphone access denied", auth.user.user_id);
  }
  act(&state, &auth, |session| session.start_recording(access))
}

/// POST /study/vocabulary/record/stop - Multipart upload of the captured clip
pub async fn record_stop(
  State(state): State<AppState>,
  auth: AuthContext,
  mut multipart: Multipart,
) -> Response {
  let mut clip = None;
  loop {
    match multipart.next_field().await {
      Ok(Some(field)) if field.name() == Some(AUDIO_FIELD) => {
        let mime = field.content_type().unwrap_or("audio/webm").to_string();
        match field.bytes().await {
          Ok(bytes) => clip = Some(AudioClip::new(bytes.to_vec(), mime)),
          Err(e) => {
            tracing::warn!("Reading uploaded audio failed: {}", e);
            break;
          }
        }
      }
      Ok(Some(_)) => continue,
      Ok(None) => break,
      Err(e) => {
        tracing::warn!("Malformed recording upload: {}", e);
        break;
      }
    }
  }

  // A missing or unreadable clip counts as empty and is rejected as too short
  let clip = clip.unwrap_or_else(|| AudioClip::new(Vec::new(), "audio/webm"));
  tracing::debug!("{}: recording of {} bytes", auth.user.user_id, clip.len());
  act(&state, &auth, |session| session.stop_recording(clip))
}

/// POST /study/vocabulary/evaluate - Score the finished recording.
///
/// The session lock is released while the backend works; the result is only
/// applied if the learner is still on the same card.
pub async fn evaluate(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, &[Role::Student]) {
    return response;
  }

  let started = state
    .sessions
    .with_study(&auth.session_id, |slot| slot.as_mut().map(|s| s.begin_evaluation()))
    .flatten();
  let request = match started {
    None => return back_to_levels(),
    Some(Err(e)) => {
      flash_study_error(&state, &auth, &e);
      return back_to_study();
    }
    Some(Ok(request)) => request,
  };

  let result = match state.api.evaluate(&request, &auth.credentials()).await {
    Ok(raw) => normalize(&raw).map_err(|e| {
      tracing::warn!("Unusable evaluation response: {}", e);
      e.user_message()
    }),
    Err(e) => {
      e.log("Pronunciation evaluation failed");
      Err(e.user_message())
    }
  };

  let outcome = state
    .sessions
    .with_study(&auth.session_id, |slot| {
      slot.as_mut().map(|s| s.finish_evaluation(request.ticket, result))
    })
    .flatten();

  match outcome {
    Some(EvaluationOutcome::Applied { score }) => {
      tracing::debug!("{} scored {:.1} on {}", auth.user.user_id, score, request.word);
    }
    Some(EvaluationOutcome::Failed { message }) => {
      auth.flash(&state, Alert::error(message));
    }
    Some(EvaluationOutcome::Stale) | None => {
      tracing::debug!("Discarded evaluation for {}: learner moved on", request.word);
    }
  }
  back_to_study()
}

/// POST /study/vocabulary/retry
pub async fn retry(State(state): State<AppState>, auth: AuthContext) -> Response {
  act(&state, &auth, |session| session.retry())
}

/// POST /study/vocabulary/quiz/start
pub async fn quiz_start(State(state): State<AppState>, auth: AuthContext) -> Response {
  act(&state, &auth, |session| session.start_quiz())
}

/// POST /study/vocabulary/quiz/answer
pub async fn quiz_answer(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<AnswerForm>,
) -> Response {
  act(&state, &auth, |session| {
    session.select_option(&form.option);
    Ok(())
  })
}
