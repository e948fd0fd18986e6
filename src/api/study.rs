use reqwest::multipart::Form;
use serde::Deserialize;
use serde_json::Value;

use super::{ApiClient, Credentials, RequestBody};
use crate::domain::{QuizItem, WordRecord};
use crate::error::ApiError;

/// Where a learner left off
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Progress {
  pub level: String,
  #[serde(default = "first_page")]
  pub current_page: u32,
}

fn first_page() -> u32 {
  1
}

/// Acknowledgement of `/study/complete`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Completion {
  #[serde(default)]
  pub next_page: Option<u32>,
}

impl ApiClient {
  pub async fn words(
    &self,
    level: &str,
    user_id: &str,
    credentials: &Credentials,
  ) -> Result<Vec<WordRecord>, ApiError> {
    self
      .get("/study/words", &[("level", level), ("user_id", user_id)], credentials)
      .await
  }

  /// Words the learner previously scored poorly on
  pub async fn review_words(
    &self,
    user_id: &str,
    credentials: &Credentials,
  ) -> Result<Vec<WordRecord>, ApiError> {
    self
      .get("/study/review-words", &[("user_id", user_id)], credentials)
      .await
  }

  pub async fn quiz(&self, level: &str, credentials: &Credentials) -> Result<Vec<QuizItem>, ApiError> {
    self.get("/study/quiz", &[("level", level)], credentials).await
  }

  pub async fn current_progress(
    &self,
    user_id: &str,
    credentials: &Credentials,
  ) -> Result<Progress, ApiError> {
    self
      .get("/study/current-progress", &[("user_id", user_id)], credentials)
      .await
  }

  /// Mark a level session finished
  pub async fn complete(
    &self,
    level: &str,
    user_id: &str,
    credentials: &Credentials,
  ) -> Result<Completion, ApiError> {
    let form = Form::new()
      .text("level", level.to_string())
      .text("user_id", user_id.to_string());
    let body: Value = self
      .post("/study/complete", credentials, RequestBody::Multipart(form))
      .await?;
    Ok(serde_json::from_value(body).unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use crate::api::Credentials;
  use crate::testing::FakeBackend;

  #[tokio::test]
  async fn test_words_and_quiz() {
    let backend = FakeBackend::start().await.unwrap();
    let client = backend.client();
    let words = client.words("초급1", "student1", &Credentials::none()).await.unwrap();
    assert_eq!(words.len(), 10);
    assert_eq!(words[0].word, "사과");
    let quiz = client.quiz("초급1", &Credentials::none()).await.unwrap();
    assert_eq!(quiz[0].answer, "사과");
  }

  #[tokio::test]
  async fn test_complete_sends_multipart_fields() {
    let backend = FakeBackend::start().await.unwrap();
    let client = backend.client();
    let done = client.complete("초급2", "student1", &Credentials::none()).await.unwrap();
    assert_eq!(done.next_page, Some(2));
    assert_eq!(backend.completions(), vec![("초급2".to_string(), "student1".to_string())]);
  }

  #[tokio::test]
  async fn test_current_progress() {
    let backend = FakeBackend::start().await.unwrap();
    let progress = backend
      .client()
      .current_progress("student1", &Credentials::none())
      .await
      .unwrap();
    assert_eq!(progress.level, "초급1");
    assert_eq!(progress.current_page, 3);
  }
}
