use serde::Serialize;

/// Stage of a study session. Strictly forward-moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Learning,
  ReviewIntro,
  Review,
  QuizIntro,
  Quiz,
  Complete,
}

impl Phase {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Learning => "learning",
      Self::ReviewIntro => "review_intro",
      Self::Review => "review",
      Self::QuizIntro => "quiz_intro",
      Self::Quiz => "quiz",
      Self::Complete => "complete",
    }
  }

  /// Phases that step through word cards
  pub fn is_card_phase(&self) -> bool {
    matches!(self, Self::Learning | Self::Review)
  }

  /// Phases that hold index 0 and show no item
  pub fn is_interstitial(&self) -> bool {
    matches!(self, Self::ReviewIntro | Self::QuizIntro | Self::Complete)
  }
}

/// What a navigation request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// Moved to another item within the phase
  Advanced,
  /// Encouragement interstitial shown instead of advancing
  Encouragement,
  PhaseChanged(Phase),
  /// Entered `Complete`; returned once per session
  Completed,
  /// Refused: gate closed or an interstitial is up
  Blocked,
  /// Nothing to do (first item, intro phases)
  Unchanged,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_phase_kinds() {
    assert!(Phase::Learning.is_card_phase());
    assert!(Phase::Review.is_card_phase());
    assert!(!Phase::Quiz.is_card_phase());
    assert!(Phase::QuizIntro.is_interstitial());
    assert!(!Phase::Quiz.is_interstitial());
    assert_eq!(Phase::ReviewIntro.as_str(), "review_intro");
  }
}
