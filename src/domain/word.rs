//! Vocabulary words and quiz questions as used by the study flow.

use serde::{Deserialize, Serialize};

use super::level;

/// Backend ids arrive as numbers or strings depending on the endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  Number(i64),
  Text(String),
}

impl std::fmt::Display for RecordId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{}", n),
      Self::Text(s) => write!(f, "{}", s),
    }
  }
}

/// Word record as returned by `/study/words` and `/study/review-words`
#[derive(Debug, Clone, Deserialize)]
pub struct WordRecord {
  #[serde(default)]
  pub id: Option<RecordId>,
  pub word: String,
  #[serde(default)]
  pub meaning: String,
  #[serde(default, alias = "meaning_en")]
  pub eng_meaning: Option<String>,
  #[serde(default)]
  pub example: Option<String>,
  #[serde(default)]
  pub audio_path: Option<String>,
  #[serde(default)]
  pub pronunciation: Option<String>,
  #[serde(default)]
  pub image_path: Option<String>,
}

/// A vocabulary word being studied.
///
/// Immutable once loaded except for `score`, the most recent evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyItem {
  pub id: String,
  pub word: String,
  pub pronunciation: String,
  pub meaning: String,
  pub meaning_eng: String,
  pub example: String,
  pub audio_key: String,
  pub image_key: Option<String>,
  pub score: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.trim().is_empty())
}

impl StudyItem {
  /// Build from a wire record, filling display defaults
  pub fn from_record(record: WordRecord, position: usize) -> Self {
    let pronunciation =
      non_empty(record.pronunciation).unwrap_or_else(|| format!("[{}]", record.word));
    let example = non_empty(record.example).unwrap_or_else(|| record.word.clone());
    Self {
      id: record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| position.to_string()),
      pronunciation,
      meaning: record.meaning,
      meaning_eng: non_empty(record.eng_meaning).unwrap_or_else(|| "Meaning".to_string()),
      example,
      audio_key: record.audio_path.unwrap_or_default(),
      image_key: non_empty(record.image_path),
      word: record.word,
      score: None,
    }
  }

  /// Sentence the learner reads aloud on the practice face
  pub fn target_text(&self) -> &str {
    if self.example.trim().is_empty() {
      &self.word
    } else {
      &self.example
    }
  }

  pub fn is_weak(&self, threshold: f64) -> bool {
    self.score.is_some_and(|s| s < threshold)
  }
}

/// Map a list of wire records to study items
pub fn to_study_items(records: Vec<WordRecord>) -> Vec<StudyItem> {
  records
    .into_iter()
    .enumerate()
    .map(|(i, r)| StudyItem::from_record(r, i))
    .collect()
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizItem {
  pub question: String,
  pub options: Vec<String>,
  pub answer: String,
}

/// Which bundled recording to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
  Word,
  Example,
}

impl AudioKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Word => "voca",
      Self::Example => "example",
    }
  }
}

/// Extract `levelN` from keys like "Level6_1" or "level 6_1"
fn level_dir_from_key(key: &str) -> Option<String> {
  let lower = key.to_ascii_lowercase();
  let start = lower.find("level")? + "level".len();
  let rest = lower[start..].trim_start();
  let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() {
    None
  } else {
    Some(format!("level{}", digits))
  }
}

/// URL of the bundled audio for an item, or None when it has no audio.
///
/// Absolute URLs are used as-is. Otherwise the level directory is taken
/// from the key itself, falling back to the studied level's directory.
pub fn audio_url(kind: AudioKind, audio_key: &str, level_id: &str) -> Option<String> {
  let key = audio_key.trim();
  if key.is_empty() {
    return None;
  }
  if key.starts_with("http") {
    return Some(key.to_string());
  }
  let dir = level_dir_from_key(key).unwrap_or_else(|| level::audio_dir_for(level_id).to_string());
  Some(format!("/assets/audio/{}/{}/{}.wav", kind.as_str(), dir, key))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(json: &str) -> WordRecord {
    serde_json::from_str(json).unwrap()
  }

  #[test]
  fn test_from_record_fills_defaults() {
    let item = StudyItem::from_record(record(r#"{"word": "사과", "meaning": "apple"}"#), 3);
    assert_eq!(item.id, "3");
    assert_eq!(item.pronunciation, "[사과]");
    assert_eq!(item.example, "사과");
    assert_eq!(item.meaning_eng, "Meaning");
    assert_eq!(item.audio_key, "");
    assert!(item.score.is_none());
  }

  #[test]
  fn test_from_record_keeps_values_and_aliases() {
    let item = StudyItem::from_record(
      record(
        r#"{"id": 17, "word": "학교", "meaning": "school", "meaning_en": "school",
            "example": "학교에 가요.", "audio_path": "Level1_3", "pronunciation": "[학꾜]"}"#,
      ),
      0,
    );
    assert_eq!(item.id, "17");
    assert_eq!(item.meaning_eng, "school");
    assert_eq!(item.target_text(), "학교에 가요.");
    assert_eq!(item.pronunciation, "[학꾜]");
  }

  #[test]
  fn test_is_weak_requires_score() {
    let mut item = StudyItem::from_record(record(r#"{"word": "물"}"#), 0);
    assert!(!item.is_weak(70.0));
    item.score = Some(45.0);
    assert!(item.is_weak(70.0));
    item.score = Some(70.0);
    assert!(!item.is_weak(70.0));
  }

  #[test]
  fn test_audio_url_parses_level_from_key() {
    assert_eq!(
      audio_url(AudioKind::Word, "Level6_1", "초급1").as_deref(),
      Some("/assets/audio/voca/level6/Level6_1.wav")
    );
    assert_eq!(
      audio_url(AudioKind::Example, "LEVEL 2_10", "초급1").as_deref(),
      Some("/assets/audio/example/level2/LEVEL 2_10.wav")
    );
  }

  #[test]
  fn test_audio_url_falls_back_to_level_dir() {
    assert_eq!(
      audio_url(AudioKind::Word, "apple", "중급2").as_deref(),
      Some("/assets/audio/voca/level4/apple.wav")
    );
  }

  #[test]
  fn test_audio_url_absolute_and_empty() {
    assert_eq!(
      audio_url(AudioKind::Word, "https://cdn/x.wav", "초급1").as_deref(),
      Some("https://cdn/x.wav")
    );
    assert_eq!(audio_url(AudioKind::Word, "  ", "초급1"), None);
  }
}
