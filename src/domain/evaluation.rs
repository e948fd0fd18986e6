//! Pronunciation scoring results.
//!
//! The speech endpoint has answered in a few different shapes over time. Each
//! known shape is a variant of [`ScoringPayload`]; [`normalize`] maps the raw
//! response onto one canonical [`EvaluationResult`] and rejects anything else.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Sentence/word marker the scorer emits for silence
const SILENCE: &str = "!SIL";

/// How many nested `result` objects are unwrapped
const RESULT_ENVELOPE_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PhoneScore {
    pub symbol: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyllableScore {
    pub text: String,
    pub score: f64,
    pub phones: Vec<PhoneScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordScore {
    pub text: String,
    pub score: f64,
    pub syllables: Vec<SyllableScore>,
}

impl WordScore {
    pub fn grade(&self) -> ScoreGrade {
        ScoreGrade::from_score(self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fluency {
    /// Syllables per second
    pub speech_rate: f64,
    pub correct_syllables: u32,
    pub syllables: u32,
}

/// Canonical scoring result for one recording
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub overall_score: f64,
    pub words: Vec<WordScore>,
    pub fluency: Option<Fluency>,
}

impl EvaluationResult {
    pub fn rounded_score(&self) -> i64 {
        self.overall_score.round() as i64
    }

    pub fn grade(&self) -> ScoreGrade {
        ScoreGrade::from_score(self.overall_score)
    }
}

/// Display band for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreGrade {
    Good,
    Fair,
    Poor,
}

impl ScoreGrade {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    /// The endpoint reported `success: false`
    #[error("Scoring failed: {0}")]
    Rejected(String),

    #[error("Unrecognized scoring response: {0}")]
    Unrecognized(String),

    #[error("Scoring response carried no score")]
    MissingScore,
}

impl EvaluationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(reason) => format!("Evaluation failed: {}", reason),
            Self::Unrecognized(_) | Self::MissingScore => {
                "The evaluation result could not be displayed.".to_string()
            }
        }
    }
}

// ==================== Wire shapes ====================

#[derive(Debug, Default, Deserialize)]
struct QualityReport {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    sentences: Vec<SentenceReport>,
}

#[derive(Debug, Deserialize)]
struct SentenceReport {
    #[serde(default)]
    text: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    words: Vec<WordReport>,
}

#[derive(Debug, Deserialize)]
struct WordReport {
    #[serde(default)]
    text: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    syll: Vec<SyllableReport>,
}

#[derive(Debug, Deserialize)]
struct SyllableReport {
    #[serde(default)]
    text: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    phones: Vec<PhoneReport>,
}

#[derive(Debug, Deserialize)]
struct PhoneReport {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Deserialize)]
struct FluencyReport {
    #[serde(rename = "speech rate", default)]
    speech_rate: f64,
    #[serde(rename = "correct syllable count", default)]
    correct_syllables: u32,
    #[serde(rename = "syllable count", default)]
    syllables: u32,
}

#[derive(Debug, Deserialize)]
struct QualityPayload {
    #[serde(default)]
    score: Option<f64>,
    quality: QualityReport,
    #[serde(default)]
    fluency: Option<FluencyReport>,
}

/// The known payload shapes, after envelopes are peeled off
#[derive(Debug)]
enum ScoringPayload {
    /// Full report with sentence/word/syllable breakdown
    Quality(QualityPayload),
    /// Bare `{ "score": n }`
    ScoreOnly(f64),
}

/// Unwraps `{success, result, score}` and `{result: {...}}` envelopes.
/// Returns the inner body and the envelope's own score, if any.
fn unwrap_envelope(raw: &Value) -> Result<(&Value, Option<f64>), EvaluationError> {
    let Value::Object(map) = raw else {
        return Err(EvaluationError::Unrecognized("not a JSON object".to_string()));
    };

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = map
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(EvaluationError::Rejected(reason.to_string()));
    }

    let envelope_score = map.get("score").and_then(Value::as_f64);
    let mut body = raw;
    // At most two `result` levels, with or without a `success` flag
    for _ in 0..RESULT_ENVELOPE_DEPTH {
        match body.get("result") {
            Some(inner @ Value::Object(_)) => body = inner,
            _ => break,
        }
    }
    Ok((body, envelope_score))
}

fn classify(body: &Value) -> Result<ScoringPayload, EvaluationError> {
    if body.get("quality").is_some_and(Value::is_object) {
        let payload: QualityPayload = serde_json::from_value(body.clone())
            .map_err(|e| EvaluationError::Unrecognized(e.to_string()))?;
        return Ok(ScoringPayload::Quality(payload));
    }
    if let Some(score) = body.get("score").and_then(Value::as_f64) {
        return Ok(ScoringPayload::ScoreOnly(score));
    }
    for key in ["score_result", "data"] {
        if let Some(inner @ Value::Object(_)) = body.get(key) {
            return classify(inner);
        }
    }
    Err(EvaluationError::Unrecognized(describe_keys(body)))
}

fn describe_keys(body: &Value) -> String {
    match body {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("keys [{}]", keys.join(", "))
        }
        other => format!("{} value", json_kind(other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn first_spoken(sentences: &[SentenceReport]) -> Option<&SentenceReport> {
    sentences
        .iter()
        .find(|s| !s.text.is_empty() && s.text != SILENCE)
}

fn breakdown(sentence: &SentenceReport) -> Vec<WordScore> {
    sentence
        .words
        .iter()
        .filter(|w| !w.text.is_empty() && w.text != SILENCE)
        .map(|w| WordScore {
            text: w.text.clone(),
            score: w.score,
            syllables: w
                .syll
                .iter()
                .map(|s| SyllableScore {
                    text: s.text.clone(),
                    score: s.score,
                    phones: s
                        .phones
                        .iter()
                        .filter_map(|p| {
                            p.symbol.as_ref().map(|symbol| PhoneScore {
                                symbol: symbol.clone(),
                                score: p.score,
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Normalize a raw scoring response.
///
/// Overall score priority: the payload's own `score`, then `quality.score`,
/// then the first non-silence sentence, then the envelope's `score`.
pub fn normalize(raw: &Value) -> Result<EvaluationResult, EvaluationError> {
    let (body, envelope_score) = unwrap_envelope(raw)?;

    match classify(body)? {
        ScoringPayload::ScoreOnly(score) => Ok(EvaluationResult {
            overall_score: score,
            words: Vec::new(),
            fluency: None,
        }),
        ScoringPayload::Quality(payload) => {
            let spoken = first_spoken(&payload.quality.sentences);
            let overall_score = payload
                .score
                .or(payload.quality.score.filter(|s| *s != 0.0))
                .or_else(|| spoken.and_then(|s| s.score))
                .or(envelope_score)
                .ok_or(EvaluationError::MissingScore)?;

            Ok(EvaluationResult {
                overall_score,
                words: spoken.map(breakdown).unwrap_or_default(),
                fluency: payload.fluency.map(|f| Fluency {
                    speech_rate: f.speech_rate,
                    correct_syllables: f.correct_syllables,
                    syllables: f.syllables,
                }),
            })
        }
    }
}
