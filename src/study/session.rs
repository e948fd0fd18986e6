//! Study session state machine.
//!
//! One session walks a learner through a level: every word card (with an
//! optional record-and-score cycle on the practice face), a review pass over
//! words that scored below the threshold, then the quiz. Time is passed in by
//! the caller so timed interstitials are deterministic.

use chrono::{DateTime, Duration, Utc};

use super::phase::{Phase, Step};
use super::recording::{AudioClip, MicAccess, RecordingAttempt, RecordingStatus};
use super::StudyError;
use crate::config::StudyConfig;
use crate::domain::{EvaluationResult, QuizItem, StudyItem};

/// Thresholds and delays that shape the flow
#[derive(Debug, Clone, PartialEq)]
pub struct StudyRules {
  pub review_threshold: f64,
  pub encouragement_index: usize,
  pub encouragement_delay: Duration,
  pub review_intro_delay: Duration,
  pub min_recording_bytes: usize,
}

impl From<&StudyConfig> for StudyRules {
  fn from(config: &StudyConfig) -> Self {
    Self {
      review_threshold: config.review_threshold,
      encouragement_index: config.encouragement_index,
      encouragement_delay: Duration::milliseconds(config.encouragement_delay_ms as i64),
      review_intro_delay: Duration::milliseconds(config.review_intro_delay_ms as i64),
      min_recording_bytes: config.min_recording_bytes,
    }
  }
}

impl Default for StudyRules {
  fn default() -> Self {
    Self::from(&StudyConfig::default())
  }
}

/// Timed screen waiting for `tick`
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interstitial {
  Encouragement { until: DateTime<Utc> },
  ReviewIntro { until: DateTime<Utc> },
}

impl Interstitial {
  fn until(&self) -> DateTime<Utc> {
    match self {
      Self::Encouragement { until } | Self::ReviewIntro { until } => *until,
    }
  }
}

/// Identifies the card state an evaluation was started from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationTicket {
  session: u64,
  generation: u64,
}

/// Everything needed to call the scoring endpoint without holding the session
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
  pub ticket: EvaluationTicket,
  pub clip: AudioClip,
  pub target_text: String,
  pub word: String,
  pub user_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
  Applied { score: f64 },
  Failed { message: String },
  /// The learner moved on; the result was dropped
  Stale,
}

#[derive(Debug, Clone)]
pub struct StudySession {
  /// Random per instance; tickets from a replaced session never match
  instance: u64,
  level: String,
  user_id: String,
  rules: StudyRules,
  phase: Phase,
  index: usize,
  words: Vec<StudyItem>,
  review: Vec<StudyItem>,
  quiz: Vec<QuizItem>,
  interstitial: Option<Interstitial>,
  encouragement_shown: bool,

  // Per-item state, cleared whenever the learner leaves an item
  flipped: bool,
  recording: RecordingAttempt,
  evaluation: Option<EvaluationResult>,
  evaluating: bool,
  generation: u64,
  quiz_selection: Option<String>,
  quiz_correct: Option<bool>,
}

impl StudySession {
  /// Start a full session at the first word
  pub fn new(
    level: impl Into<String>,
    user_id: impl Into<String>,
    words: Vec<StudyItem>,
    quiz: Vec<QuizItem>,
    rules: StudyRules,
  ) -> Result<Self, StudyError> {
    if words.is_empty() {
      return Err(StudyError::NoItems);
    }
    Ok(Self {
      instance: rand::random(),
      level: level.into(),
      user_id: user_id.into(),
      rules,
      phase: Phase::Learning,
      index: 0,
      words,
      review: Vec::new(),
      quiz,
      interstitial: None,
      encouragement_shown: false,
      flipped: false,
      recording: RecordingAttempt::default(),
      evaluation: None,
      evaluating: false,
      generation: 0,
      quiz_selection: None,
      quiz_correct: None,
    })
  }

  /// Start at the review intro with words the learner previously got wrong
  pub fn review_only(
    level: impl Into<String>,
    user_id: impl Into<String>,
    weak_words: Vec<StudyItem>,
    quiz: Vec<QuizItem>,
    rules: StudyRules,
    now: DateTime<Utc>,
  ) -> Result<Self, StudyError> {
    let mut session = Self::new(level, user_id, weak_words, quiz, rules)?;
    session.review = std::mem::take(&mut session.words);
    session.enter_review_intro(now);
    Ok(session)
  }

  // ==================== Views ====================

  pub fn instance(&self) -> u64 {
    self.instance
  }

  pub fn level(&self) -> &str {
    &self.level
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn words(&self) -> &[StudyItem] {
    &self.words
  }

  pub fn review_items(&self) -> &[StudyItem] {
    &self.review
  }

  pub fn quiz_items(&self) -> &[QuizItem] {
    &self.quiz
  }

  /// Length of the list the current phase iterates, 0 for interstitials
  pub fn active_len(&self) -> usize {
    match self.phase {
      Phase::Learning => self.words.len(),
      Phase::Review => self.review.len(),
      Phase::Quiz => self.quiz.len(),
      _ => 0,
    }
  }

  pub fn current_item(&self) -> Option<&StudyItem> {
    match self.phase {
      Phase::Learning => self.words.get(self.index),
      Phase::Review => self.review.get(self.index),
      _ => None,
    }
  }

  pub fn current_quiz(&self) -> Option<&QuizItem> {
    match self.phase {
      Phase::Quiz => self.quiz.get(self.index),
      _ => None,
    }
  }

  pub fn is_flipped(&self) -> bool {
    self.flipped
  }

  pub fn recording(&self) -> &RecordingAttempt {
    &self.recording
  }

  pub fn evaluation(&self) -> Option<&EvaluationResult> {
    self.evaluation.as_ref()
  }

  pub fn is_evaluating(&self) -> bool {
    self.evaluating
  }

  pub fn quiz_selection(&self) -> Option<&str> {
    self.quiz_selection.as_deref()
  }

  pub fn quiz_correct(&self) -> Option<bool> {
    self.quiz_correct
  }

  pub fn showing_encouragement(&self) -> bool {
    matches!(self.interstitial, Some(Interstitial::Encouragement { .. }))
  }

  /// Time left on the current timed screen, if one is up
  pub fn interstitial_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
    self
      .interstitial
      .map(|i| (i.until() - now).max(Duration::zero()))
  }

  /// Whether "next" is currently allowed
  pub fn can_go_next(&self) -> bool {
    if self.showing_encouragement() {
      return false;
    }
    match self.phase {
      Phase::Learning | Phase::Review => !self.flipped || self.evaluation.is_some(),
      Phase::Quiz => self.quiz_correct == Some(true),
      _ => false,
    }
  }

  // ==================== Transitions ====================

  /// Resolve timed screens whose delay has elapsed. Returns true on change.
  pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
    let Some(interstitial) = self.interstitial else {
      return false;
    };
    if now < interstitial.until() {
      return false;
    }
    self.interstitial = None;
    match interstitial {
      Interstitial::Encouragement { .. } => {
        self.move_to(self.index + 1);
      }
      Interstitial::ReviewIntro { .. } => {
        self.enter(Phase::Review);
      }
    }
    true
  }

  /// Toggle between the word face and the practice face
  pub fn flip(&mut self) -> Result<(), StudyError> {
    self.ensure_card_input("flip")?;
    self.flipped = !self.flipped;
    Ok(())
  }

  pub fn next(&mut self, now: DateTime<Utc>) -> Step {
    if self.interstitial.is_some() {
      return Step::Blocked;
    }
    match self.phase {
      Phase::Learning | Phase::Review | Phase::Quiz if !self.can_go_next() => Step::Blocked,
      Phase::Learning => {
        let last = self.index + 1 >= self.words.len();
        if self.index == self.rules.encouragement_index && !last && !self.encouragement_shown {
          self.encouragement_shown = true;
          self.leave_item();
          self.interstitial = Some(Interstitial::Encouragement {
            until: now + self.rules.encouragement_delay,
          });
          Step::Encouragement
        } else if !last {
          self.move_to(self.index + 1);
          Step::Advanced
        } else {
          self.finish_learning(now)
        }
      }
      Phase::Review => {
        if self.index + 1 < self.review.len() {
          self.move_to(self.index + 1);
          Step::Advanced
        } else {
          self.after_study()
        }
      }
      Phase::Quiz => {
        if self.index + 1 < self.quiz.len() {
          self.move_to(self.index + 1);
          Step::Advanced
        } else {
          self.complete()
        }
      }
      Phase::ReviewIntro | Phase::QuizIntro | Phase::Complete => Step::Unchanged,
    }
  }

  /// Step back within the current phase. Never gated.
  pub fn previous(&mut self) -> Step {
    if self.showing_encouragement() {
      return Step::Blocked;
    }
    match self.phase {
      Phase::Learning | Phase::Review | Phase::Quiz if self.index > 0 => {
        self.move_to(self.index - 1);
        Step::Advanced
      }
      _ => Step::Unchanged,
    }
  }

  /// Dismiss the quiz intro
  pub fn start_quiz(&mut self) -> Result<(), StudyError> {
    if self.phase != Phase::QuizIntro {
      return Err(StudyError::WrongPhase {
        action: "start the quiz",
        phase: self.phase,
      });
    }
    self.enter(Phase::Quiz);
    Ok(())
  }

  /// Pick a quiz option. Returns correctness, or None when ignored.
  pub fn select_option(&mut self, option: &str) -> Option<bool> {
    let answer = self.current_quiz()?.answer.clone();
    if self.quiz_correct == Some(true) {
      return None;
    }
    let correct = option == answer;
    self.quiz_selection = Some(option.to_string());
    self.quiz_correct = Some(correct);
    Some(correct)
  }

  // ==================== Recording and evaluation ====================

  pub fn start_recording(&mut self, access: MicAccess) -> Result<(), StudyError> {
    self.ensure_practice_face("record")?;
    if self.evaluating {
      return Err(StudyError::EvaluationInFlight);
    }
    self.recording.start(access)?;
    self.evaluation = None;
    Ok(())
  }

  pub fn stop_recording(&mut self, clip: AudioClip) -> Result<(), StudyError> {
    self.ensure_practice_face("record")?;
    self.recording.stop(clip, self.rules.min_recording_bytes)
  }

  /// Hand out the finished clip for scoring and mark the card as evaluating
  pub fn begin_evaluation(&mut self) -> Result<EvaluationRequest, StudyError> {
    self.ensure_practice_face("evaluate")?;
    if self.evaluating {
      return Err(StudyError::EvaluationInFlight);
    }
    let clip = match (self.recording.status(), self.recording.clip()) {
      (RecordingStatus::Done, Some(clip)) => clip.clone(),
      _ => return Err(StudyError::NoRecording),
    };
    let item = self.current_item().ok_or(StudyError::NoItems)?;
    let request = EvaluationRequest {
      ticket: EvaluationTicket {
        session: self.instance,
        generation: self.generation,
      },
      clip,
      target_text: item.target_text().to_string(),
      word: item.word.clone(),
      user_id: self.user_id.clone(),
    };
    self.evaluating = true;
    Ok(request)
  }

  /// Apply a scoring result unless the learner has moved on since
  pub fn finish_evaluation(
    &mut self,
    ticket: EvaluationTicket,
    result: Result<EvaluationResult, String>,
  ) -> EvaluationOutcome {
    if ticket.session != self.instance || ticket.generation != self.generation {
      return EvaluationOutcome::Stale;
    }
    self.evaluating = false;
    match result {
      Ok(evaluation) => {
        let score = evaluation.overall_score;
        self.annotate_current(score);
        self.evaluation = Some(evaluation);
        EvaluationOutcome::Applied { score }
      }
      Err(message) => EvaluationOutcome::Failed { message },
    }
  }

  /// Discard the recording and result, staying on the practice face
  pub fn retry(&mut self) -> Result<(), StudyError> {
    self.ensure_card_input("retry")?;
    self.recording.reset();
    self.evaluation = None;
    self.evaluating = false;
    self.generation += 1;
    Ok(())
  }

  // ==================== Internals ====================

  fn ensure_card_input(&self, action: &'static str) -> Result<(), StudyError> {
    if self.interstitial.is_some() {
      return Err(StudyError::Blocked);
    }
    if !self.phase.is_card_phase() {
      return Err(StudyError::WrongPhase {
        action,
        phase: self.phase,
      });
    }
    Ok(())
  }

  fn ensure_practice_face(&self, action: &'static str) -> Result<(), StudyError> {
    self.ensure_card_input(action)?;
    if !self.flipped {
      return Err(StudyError::NotOnPracticeFace);
    }
    Ok(())
  }

  fn annotate_current(&mut self, score: f64) {
    let index = self.index;
    let id = match self.phase {
      Phase::Learning => self.words.get_mut(index),
      Phase::Review => self.review.get_mut(index),
      _ => None,
    }
    .map(|item| {
      item.score = Some(score);
      item.id.clone()
    });
    // Keep the learning list in sync so stats reflect the latest attempt
    if let (Phase::Review, Some(id)) = (self.phase, id) {
      if let Some(word) = self.words.iter_mut().find(|w| w.id == id) {
        word.score = Some(score);
      }
    }
  }

  fn leave_item(&mut self) {
    self.flipped = false;
    self.recording.reset();
    self.evaluation = None;
    self.evaluating = false;
    self.quiz_selection = None;
    self.quiz_correct = None;
    self.generation += 1;
  }

  fn move_to(&mut self, index: usize) {
    self.leave_item();
    self.index = index.min(self.active_len().saturating_sub(1));
  }

  fn enter(&mut self, phase: Phase) {
    self.leave_item();
    self.phase = phase;
    self.index = 0;
  }

  fn enter_review_intro(&mut self, now: DateTime<Utc>) {
    self.enter(Phase::ReviewIntro);
    self.interstitial = Some(Interstitial::ReviewIntro {
      until: now + self.rules.review_intro_delay,
    });
  }

  fn finish_learning(&mut self, now: DateTime<Utc>) -> Step {
    let threshold = self.rules.review_threshold;
    let weak: Vec<StudyItem> = self
      .words
      .iter()
      .filter(|w| w.is_weak(threshold))
      .cloned()
      .collect();
    if weak.is_empty() {
      return self.after_study();
    }
    tracing::debug!("{} weak words queued for review", weak.len());
    self.review = weak;
    self.enter_review_intro(now);
    Step::PhaseChanged(Phase::ReviewIntro)
  }

  fn after_study(&mut self) -> Step {
    if self.quiz.is_empty() {
      self.complete()
    } else {
      self.enter(Phase::QuizIntro);
      Step::PhaseChanged(Phase::QuizIntro)
    }
  }

  fn complete(&mut self) -> Step {
    self.interstitial = None;
    self.enter(Phase::Complete);
    Step::Completed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::evaluation::EvaluationResult;

  fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).unwrap()
  }

  fn item(i: usize) -> StudyItem {
    StudyItem {
      id: i.to_string(),
      word: format!("단어{}", i),
      pronunciation: format!("[단어{}]", i),
      meaning: "meaning".to_string(),
      meaning_eng: "Meaning".to_string(),
      example: format!("예문 {}", i),
      audio_key: String::new(),
      image_key: None,
      score: None,
    }
  }

  fn words(n: usize) -> Vec<StudyItem> {
    (0..n).map(item).collect()
  }

  fn fruit_quiz() -> Vec<QuizItem> {
    vec![QuizItem {
      question: "apple?".to_string(),
      options: vec!["사과".to_string(), "바나나".to_string(), "포도".to_string()],
      answer: "사과".to_string(),
    }]
  }

  fn result(score: f64) -> EvaluationResult {
    EvaluationResult {
      overall_score: score,
      words: Vec::new(),
      fluency: None,
    }
  }

  fn clip() -> AudioClip {
    AudioClip::new(vec![7; 4096], "audio/webm")
  }

  /// Flip, record, and score the current card
  fn score_current(session: &mut StudySession, score: f64) {
    session.flip().unwrap();
    session.start_recording(MicAccess::Granted).unwrap();
    session.stop_recording(clip()).unwrap();
    let request = session.begin_evaluation().unwrap();
    assert_eq!(
      session.finish_evaluation(request.ticket, Ok(result(score))),
      EvaluationOutcome::Applied { score }
    );
  }

  /// Press next, riding through the encouragement screen if it shows
  fn advance(session: &mut StudySession, now: &mut DateTime<Utc>) -> Step {
    let step = session.next(*now);
    if step == Step::Encouragement {
      *now += Duration::milliseconds(1500);
      assert!(session.tick(*now));
      return Step::Advanced;
    }
    step
  }

  #[test]
  fn test_empty_word_list_is_rejected() {
    let err = StudySession::new("초급1", "u1", vec![], vec![], StudyRules::default()).unwrap_err();
    assert_eq!(err, StudyError::NoItems);
  }

  #[test]
  fn test_all_scores_pass_skips_review() {
    let mut now = t0();
    let mut s = StudySession::new("초급1", "u1", words(10), fruit_quiz(), StudyRules::default()).unwrap();
    let mut steps = Vec::new();
    for _ in 0..10 {
      score_current(&mut s, 85.0);
      steps.push(advance(&mut s, &mut now));
    }
    assert_eq!(steps.last(), Some(&Step::PhaseChanged(Phase::QuizIntro)));
    assert!(!steps.contains(&Step::PhaseChanged(Phase::ReviewIntro)));

    s.start_quiz().unwrap();
    assert_eq!(s.phase(), Phase::Quiz);
    assert_eq!(s.select_option("사과"), Some(true));
    assert_eq!(s.next(now), Step::Completed);
    assert_eq!(s.phase(), Phase::Complete);
    assert_eq!(s.next(now), Step::Unchanged);
  }

  #[test]
  fn test_one_weak_word_seeds_review() {
    let mut now = t0();
    let mut s = StudySession::new("초급1", "u1", words(10), fruit_quiz(), StudyRules::default()).unwrap();
    let mut last = Step::Unchanged;
    for i in 0..10 {
      score_current(&mut s, if i == 2 { 45.0 } else { 90.0 });
      last = advance(&mut s, &mut now);
    }
    assert_eq!(last, Step::PhaseChanged(Phase::ReviewIntro));
    assert_eq!(s.review_items().len(), 1);
    assert_eq!(s.review_items()[0].id, "2");
    assert_eq!(s.index(), 0);

    // Inputs do nothing until the intro times out
    assert_eq!(s.next(now), Step::Blocked);
    assert!(!s.tick(now + Duration::milliseconds(2999)));
    assert!(s.tick(now + Duration::milliseconds(3000)));
    assert_eq!(s.phase(), Phase::Review);
    assert_eq!(s.current_item().map(|i| i.id.as_str()), Some("2"));

    assert_eq!(s.next(now), Step::PhaseChanged(Phase::QuizIntro));
  }

  #[test]
  fn test_review_only_iff_weak_word() {
    // Unscored words never count as weak
    let mut now = t0();
    let mut s = StudySession::new("초급1", "u1", words(3), vec![], StudyRules::default()).unwrap();
    advance(&mut s, &mut now);
    advance(&mut s, &mut now);
    assert_eq!(s.next(now), Step::Completed);

    // A score exactly at the threshold is not weak
    let mut s = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    score_current(&mut s, 70.0);
    assert_eq!(s.next(now), Step::Completed);

    let mut s = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    score_current(&mut s, 69.9);
    assert_eq!(s.next(now), Step::PhaseChanged(Phase::ReviewIntro));
    assert!(s.tick(now + Duration::seconds(5)));
    score_current(&mut s, 95.0);
    assert_eq!(s.next(now), Step::Completed);
    assert_eq!(s.words()[0].score, Some(95.0));
  }

  #[test]
  fn test_microphone_denied() {
    let mut s = StudySession::new("초급1", "u1", words(2), vec![], StudyRules::default()).unwrap();
    s.flip().unwrap();
    assert_eq!(s.start_recording(MicAccess::Denied), Err(StudyError::MicrophoneDenied));
    assert_eq!(s.recording().status(), RecordingStatus::Idle);
    assert!(s.recording().clip().is_none());
    assert_eq!(s.begin_evaluation().unwrap_err(), StudyError::NoRecording);
  }

  #[test]
  fn test_quiz_gate() {
    let mut s = StudySession::new("초급1", "u1", words(1), fruit_quiz(), StudyRules::default()).unwrap();
    assert_eq!(s.next(t0()), Step::PhaseChanged(Phase::QuizIntro));
    assert!(s.select_option("사과").is_none());
    s.start_quiz().unwrap();

    assert_eq!(s.select_option("바나나"), Some(false));
    assert_eq!(s.quiz_correct(), Some(false));
    assert!(!s.can_go_next());
    assert_eq!(s.next(t0()), Step::Blocked);
    assert_eq!(s.index(), 0);

    assert_eq!(s.select_option("사과"), Some(true));
    assert!(s.can_go_next());
    // Once correct, further picks are ignored
    assert_eq!(s.select_option("포도"), None);
    assert_eq!(s.quiz_selection(), Some("사과"));
  }

  #[test]
  fn test_short_recording_never_evaluates() {
    let mut s = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    s.flip().unwrap();
    s.start_recording(MicAccess::Granted).unwrap();
    let err = s.stop_recording(AudioClip::new(vec![1; 10], "audio/webm")).unwrap_err();
    assert!(matches!(err, StudyError::RecordingTooShort { .. }));
    assert_eq!(s.recording().status(), RecordingStatus::Idle);
    assert_eq!(s.begin_evaluation().unwrap_err(), StudyError::NoRecording);
  }

  #[test]
  fn test_next_gate_on_practice_face() {
    let mut s = StudySession::new("초급1", "u1", words(3), vec![], StudyRules::default()).unwrap();
    assert!(s.can_go_next());
    s.flip().unwrap();
    assert!(!s.can_go_next());
    assert_eq!(s.next(t0()), Step::Blocked);
    s.flip().unwrap();
    assert_eq!(s.next(t0()), Step::Advanced);
  }

  #[test]
  fn test_leaving_item_clears_state() {
    let mut s = StudySession::new("초급1", "u1", words(3), vec![], StudyRules::default()).unwrap();
    score_current(&mut s, 50.0);
    assert_eq!(s.next(t0()), Step::Advanced);
    assert!(!s.is_flipped());
    assert!(s.evaluation().is_none());
    assert_eq!(s.recording().status(), RecordingStatus::Idle);

    s.flip().unwrap();
    s.start_recording(MicAccess::Granted).unwrap();
    assert_eq!(s.previous(), Step::Advanced);
    assert_eq!(s.index(), 0);
    assert_eq!(s.recording().status(), RecordingStatus::Idle);
    assert!(!s.is_flipped());
    // The earlier score survives on the item itself
    assert_eq!(s.current_item().and_then(|i| i.score), Some(50.0));
  }

  #[test]
  fn test_index_stays_in_bounds() {
    let mut now = t0();
    let mut s = StudySession::new("초급1", "u1", words(6), fruit_quiz(), StudyRules::default()).unwrap();
    assert_eq!(s.previous(), Step::Unchanged);
    assert_eq!(s.index(), 0);
    for _ in 0..20 {
      advance(&mut s, &mut now);
      assert!(s.index() < s.active_len().max(1));
      s.previous();
      s.next(now);
      assert!(s.index() < s.active_len().max(1));
    }
    assert_eq!(s.phase(), Phase::QuizIntro);
    assert_eq!(s.index(), 0);
  }

  #[test]
  fn test_encouragement_blocks_then_advances() {
    let now = t0();
    let mut s = StudySession::new("초급1", "u1", words(10), vec![], StudyRules::default()).unwrap();
    for _ in 0..4 {
      assert_eq!(s.next(now), Step::Advanced);
    }
    assert_eq!(s.index(), 4);
    assert_eq!(s.next(now), Step::Encouragement);
    assert!(s.showing_encouragement());
    assert_eq!(s.next(now), Step::Blocked);
    assert_eq!(s.previous(), Step::Blocked);
    assert_eq!(s.flip(), Err(StudyError::Blocked));
    assert_eq!(
      s.interstitial_remaining(now + Duration::milliseconds(500)),
      Some(Duration::milliseconds(1000))
    );
    assert!(!s.tick(now + Duration::milliseconds(1499)));
    assert!(s.tick(now + Duration::milliseconds(1500)));
    assert_eq!(s.index(), 5);

    // Shown once per session
    s.previous();
    assert_eq!(s.index(), 4);
    assert_eq!(s.next(now), Step::Advanced);
    assert_eq!(s.index(), 5);
  }

  #[test]
  fn test_encouragement_skipped_on_last_item() {
    let mut s = StudySession::new("초급1", "u1", words(5), vec![], StudyRules::default()).unwrap();
    for _ in 0..4 {
      s.next(t0());
    }
    assert_eq!(s.next(t0()), Step::Completed);
  }

  #[test]
  fn test_stale_evaluation_is_discarded() {
    let mut s = StudySession::new("초급1", "u1", words(3), vec![], StudyRules::default()).unwrap();
    s.flip().unwrap();
    s.start_recording(MicAccess::Granted).unwrap();
    s.stop_recording(clip()).unwrap();
    let request = s.begin_evaluation().unwrap();
    assert_eq!(request.target_text, "예문 0");
    assert_eq!(request.word, "단어0");
    assert_eq!(s.begin_evaluation().unwrap_err(), StudyError::EvaluationInFlight);

    // Learner flips back and moves on while scoring is in flight
    s.flip().unwrap();
    assert_eq!(s.next(t0()), Step::Advanced);
    assert_eq!(
      s.finish_evaluation(request.ticket, Ok(result(20.0))),
      EvaluationOutcome::Stale
    );
    assert!(s.words().iter().all(|w| w.score.is_none()));
  }

  #[test]
  fn test_ticket_from_replaced_session_is_stale() {
    let mut old = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    old.flip().unwrap();
    old.start_recording(MicAccess::Granted).unwrap();
    old.stop_recording(clip()).unwrap();
    let request = old.begin_evaluation().unwrap();

    let mut fresh = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    assert_eq!(
      fresh.finish_evaluation(request.ticket, Ok(result(99.0))),
      EvaluationOutcome::Stale
    );
  }

  #[test]
  fn test_failed_evaluation_keeps_clip() {
    let mut s = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    s.flip().unwrap();
    s.start_recording(MicAccess::Granted).unwrap();
    s.stop_recording(clip()).unwrap();
    let request = s.begin_evaluation().unwrap();
    assert_eq!(
      s.finish_evaluation(request.ticket, Err("timeout".to_string())),
      EvaluationOutcome::Failed {
        message: "timeout".to_string()
      }
    );
    assert_eq!(s.recording().status(), RecordingStatus::Done);
    assert!(!s.is_evaluating());
    assert!(s.begin_evaluation().is_ok());
  }

  #[test]
  fn test_retry_clears_result_and_invalidates() {
    let mut s = StudySession::new("초급1", "u1", words(2), vec![], StudyRules::default()).unwrap();
    score_current(&mut s, 40.0);
    assert!(s.can_go_next());
    s.retry().unwrap();
    assert!(s.is_flipped());
    assert!(s.evaluation().is_none());
    assert_eq!(s.recording().status(), RecordingStatus::Idle);
    assert!(!s.can_go_next());
  }

  #[test]
  fn test_review_only_session() {
    let now = t0();
    let s = StudySession::review_only("초급1", "u1", words(2), vec![], StudyRules::default(), now);
    let mut s = s.unwrap();
    assert_eq!(s.phase(), Phase::ReviewIntro);
    assert!(s.current_item().is_none());
    assert!(s.tick(now + Duration::seconds(3)));
    assert_eq!(s.phase(), Phase::Review);
    assert_eq!(s.active_len(), 2);
    assert_eq!(s.next(now), Step::Advanced);
    assert_eq!(s.next(now), Step::Completed);

    assert!(StudySession::review_only("초급1", "u1", vec![], vec![], StudyRules::default(), now).is_err());
  }

  #[test]
  fn test_configured_rules() {
    let config = StudyConfig {
      review_threshold: 90.0,
      encouragement_index: 1,
      ..StudyConfig::default()
    };
    let rules = StudyRules::from(&config);
    let mut s = StudySession::new("초급1", "u1", words(3), vec![], rules).unwrap();
    assert_eq!(s.next(t0()), Step::Advanced);
    assert_eq!(s.next(t0()), Step::Encouragement);
  }

  #[test]
  fn test_start_quiz_wrong_phase() {
    let mut s = StudySession::new("초급1", "u1", words(1), vec![], StudyRules::default()).unwrap();
    assert!(matches!(s.start_quiz(), Err(StudyError::WrongPhase { .. })));
  }
}
