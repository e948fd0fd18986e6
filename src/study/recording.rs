//! Per-card recording sub-machine: idle -> recording -> done.

use super::StudyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
  Idle,
  Recording,
  Done,
}

impl RecordingStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::Recording => "recording",
      Self::Done => "done",
    }
  }
}

/// Outcome of the browser's microphone permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicAccess {
  Granted,
  Denied,
}

impl MicAccess {
  pub fn from_str(s: &str) -> Self {
    match s.trim() {
      "granted" => Self::Granted,
      _ => Self::Denied,
    }
  }
}

/// A captured audio clip as uploaded by the browser
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
  pub bytes: Vec<u8>,
  pub mime: String,
}

impl AudioClip {
  pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
    Self {
      bytes,
      mime: mime.into(),
    }
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// File extension matching the container, `webm` when unknown
  pub fn extension(&self) -> &'static str {
    let mime = self.mime.to_ascii_lowercase();
    if mime.contains("ogg") {
      "ogg"
    } else if mime.contains("wav") {
      "wav"
    } else {
      "webm"
    }
  }

  pub fn file_name(&self) -> String {
    format!("recording.{}", self.extension())
  }
}

/// The single live recording for the current card
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingAttempt {
  status: RecordingStatus,
  clip: Option<AudioClip>,
}

impl Default for RecordingAttempt {
  fn default() -> Self {
    Self {
      status: RecordingStatus::Idle,
      clip: None,
    }
  }
}

impl RecordingAttempt {
  pub fn status(&self) -> RecordingStatus {
    self.status
  }

  pub fn clip(&self) -> Option<&AudioClip> {
    self.clip.as_ref()
  }

  /// Begin capturing. A denied prompt leaves the attempt untouched.
  pub fn start(&mut self, access: MicAccess) -> Result<(), StudyError> {
    if self.status == RecordingStatus::Recording {
      return Err(StudyError::AlreadyRecording);
    }
    if access == MicAccess::Denied {
      return Err(StudyError::MicrophoneDenied);
    }
    self.status = RecordingStatus::Recording;
    self.clip = None;
    Ok(())
  }

  /// Finalize the capture. Truncated clips reset to idle.
  pub fn stop(&mut self, clip: AudioClip, min_bytes: usize) -> Result<(), StudyError> {
    if self.status != RecordingStatus::Recording {
      return Err(StudyError::NotRecording);
    }
    if clip.is_empty() || clip.len() < min_bytes {
      self.reset();
      return Err(StudyError::RecordingTooShort {
        bytes: clip.len(),
        min: min_bytes,
      });
    }
    self.status = RecordingStatus::Done;
    self.clip = Some(clip);
    Ok(())
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_denied_stays_idle() {
    let mut attempt = RecordingAttempt::default();
    assert_eq!(attempt.start(MicAccess::Denied), Err(StudyError::MicrophoneDenied));
    assert_eq!(attempt.status(), RecordingStatus::Idle);
    assert!(attempt.clip().is_none());
  }

  #[test]
  fn test_short_clip_resets() {
    let mut attempt = RecordingAttempt::default();
    attempt.start(MicAccess::Granted).unwrap();
    let err = attempt.stop(AudioClip::new(vec![0; 100], "audio/webm"), 2048);
    assert_eq!(err, Err(StudyError::RecordingTooShort { bytes: 100, min: 2048 }));
    assert_eq!(attempt.status(), RecordingStatus::Idle);
    assert!(attempt.clip().is_none());
  }

  #[test]
  fn test_full_cycle() {
    let mut attempt = RecordingAttempt::default();
    assert_eq!(
      attempt.stop(AudioClip::new(vec![0; 4096], "audio/webm"), 2048),
      Err(StudyError::NotRecording)
    );
    attempt.start(MicAccess::Granted).unwrap();
    assert_eq!(attempt.start(MicAccess::Granted), Err(StudyError::AlreadyRecording));
    attempt
      .stop(AudioClip::new(vec![0; 4096], "audio/ogg;codecs=opus"), 2048)
      .unwrap();
    assert_eq!(attempt.status(), RecordingStatus::Done);
    assert_eq!(attempt.clip().map(|c| c.file_name()).as_deref(), Some("recording.ogg"));
  }

  #[test]
  fn test_clip_extension_default() {
    assert_eq!(AudioClip::new(vec![], "").extension(), "webm");
    assert_eq!(AudioClip::new(vec![], "audio/wav").extension(), "wav");
    assert_eq!(MicAccess::from_str("granted"), MicAccess::Granted);
    assert_eq!(MicAccess::from_str("prompt"), MicAccess::Denied);
  }
}
