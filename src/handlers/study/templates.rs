//! Template, view, and form structs for the study flow.

use askama::Template;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::word::{audio_url, AudioKind};
use crate::domain::{StudyItem, WordScore};
use crate::nav::NavContext;
use crate::session::Alert;
use crate::study::{Phase, StudySession};

#[derive(Deserialize)]
pub struct VocabularyQuery {
  pub level: Option<String>,
  /// Start over even if a session for this level is live
  #[serde(default)]
  pub restart: Option<String>,
}

#[derive(Deserialize)]
pub struct MicForm {
  /// Outcome of the browser permission prompt: "granted" or "denied"
  pub mic: String,
}

#[derive(Deserialize)]
pub struct AnswerForm {
  pub option: String,
}

/// The card on screen
pub struct CardView {
  pub word: String,
  pub pronunciation: String,
  pub meaning: String,
  pub meaning_eng: String,
  pub example: String,
  pub word_audio: Option<String>,
  pub example_audio: Option<String>,
  pub image: Option<String>,
  pub score: Option<i64>,
}

impl CardView {
  fn new(item: &StudyItem, level: &str) -> Self {
    Self {
      word: item.word.clone(),
      pronunciation: item.pronunciation.clone(),
      meaning: item.meaning.clone(),
      meaning_eng: item.meaning_eng.clone(),
      example: item.example.clone(),
      word_audio: audio_url(AudioKind::Word, &item.audio_key, level),
      example_audio: audio_url(AudioKind::Example, &item.audio_key, level),
      image: item.image_key.clone().filter(|k| !k.is_empty()),
      score: item.score.map(|s| s.round() as i64),
    }
  }
}

pub struct EvaluationView {
  pub score: i64,
  pub grade: &'static str,
  pub words: Vec<WordScore>,
  pub speech_rate: Option<String>,
}

pub struct OptionView {
  pub text: String,
  pub selected: bool,
}

pub struct QuizView {
  pub question: String,
  pub options: Vec<OptionView>,
  /// Set once an option was picked
  pub correct: Option<bool>,
}

pub struct CompletionView {
  pub learned: usize,
  pub reviewed: usize,
  pub quizzed: usize,
  /// Mean of the scores earned this session
  pub average: Option<i64>,
}

#[derive(Template)]
#[template(path = "study/vocabulary.html")]
pub struct VocabularyTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub level: String,
  pub phase: &'static str,
  /// 1-based position within the active list
  pub position: usize,
  pub total: usize,
  pub card: Option<CardView>,
  pub flipped: bool,
  pub recording: &'static str,
  pub evaluating: bool,
  pub evaluation: Option<EvaluationView>,
  pub quiz: Option<QuizView>,
  pub can_go_next: bool,
  pub can_go_prev: bool,
  pub encouragement: bool,
  /// Seconds until the timed screen resolves itself
  pub refresh_secs: Option<i64>,
  pub review_count: usize,
  pub quiz_count: usize,
  pub completion: Option<CompletionView>,
}

impl VocabularyTemplate {
  pub fn build(
    session: &StudySession,
    nav: NavContext,
    alert: Option<Alert>,
    now: DateTime<Utc>,
  ) -> Self {
    let phase = session.phase();
    let level = session.level().to_string();

    let card = session.current_item().map(|item| CardView::new(item, &level));
    let evaluation = session.evaluation().map(|e| EvaluationView {
      score: e.rounded_score(),
      grade: e.grade().as_str(),
      words: e.words.clone(),
      speech_rate: e.fluency.as_ref().map(|f| format!("{:.1}", f.speech_rate)),
    });
    let quiz = session.current_quiz().map(|q| QuizView {
      question: q.question.clone(),
      options: q
        .options
        .iter()
        .map(|o| OptionView {
          text: o.clone(),
          selected: session.quiz_selection() == Some(o.as_str()),
        })
        .collect(),
      correct: session.quiz_correct(),
    });

    let refresh_secs = session.interstitial_remaining(now).map(|left| {
      let millis = left.num_milliseconds().max(0);
      ((millis + 999) / 1000).max(1)
    });

    let completion = (phase == Phase::Complete).then(|| {
      // Review items mirror word scores; review-only sessions have no words
      let scored = if session.words().is_empty() {
        session.review_items()
      } else {
        session.words()
      };
      let scores: Vec<f64> = scored.iter().filter_map(|item| item.score).collect();
      let average = (!scores.is_empty())
        .then(|| (scores.iter().sum::<f64>() / scores.len() as f64).round() as i64);
      CompletionView {
        learned: session.words().len(),
        reviewed: session.review_items().len(),
        quizzed: session.quiz_items().len(),
        average,
      }
    });

    Self {
      nav,
      alert,
      level,
      phase: phase.as_str(),
      position: session.index() + 1,
      total: session.active_len(),
      card,
      flipped: session.is_flipped(),
      recording: session.recording().status().as_str(),
      evaluating: session.is_evaluating(),
      evaluation,
      quiz,
      can_go_next: session.can_go_next(),
      can_go_prev: !phase.is_interstitial() && session.index() > 0,
      encouragement: session.showing_encouragement(),
      refresh_secs,
      review_count: session.review_items().len(),
      quiz_count: session.quiz_items().len(),
      completion,
    }
  }
}
