//! Vocabulary study flow: learning, optional review of weak words, quiz.

pub mod phase;
pub mod recording;
pub mod session;

pub use phase::{Phase, Step};
pub use recording::{AudioClip, MicAccess, RecordingAttempt, RecordingStatus};
pub use session::{EvaluationOutcome, EvaluationRequest, EvaluationTicket, StudyRules, StudySession};

use crate::error::ErrorClass;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StudyError {
  #[error("No words to study")]
  NoItems,

  #[error("Microphone access denied")]
  MicrophoneDenied,

  #[error("Recording too short ({bytes} bytes, need {min})")]
  RecordingTooShort { bytes: usize, min: usize },

  #[error("Already recording")]
  AlreadyRecording,

  #[error("Not recording")]
  NotRecording,

  #[error("Flip the card to the practice side first")]
  NotOnPracticeFace,

  #[error("No finished recording to evaluate")]
  NoRecording,

  #[error("An evaluation is already in progress")]
  EvaluationInFlight,

  #[error("Cannot {action} during {phase:?}")]
  WrongPhase { action: &'static str, phase: Phase },

  #[error("Please wait a moment")]
  Blocked,
}

impl StudyError {
  pub fn class(&self) -> ErrorClass {
    match self {
      Self::MicrophoneDenied => ErrorClass::Unexpected,
      _ => ErrorClass::Validation,
    }
  }

  pub fn user_message(&self) -> String {
    match self {
      Self::MicrophoneDenied => {
        "Microphone access was denied. Allow microphone access in your browser settings.".to_string()
      }
      Self::RecordingTooShort { .. } => {
        "The recording was too short. Please record again.".to_string()
      }
      other => other.to_string(),
    }
  }
}
