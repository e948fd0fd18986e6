use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::{ApiClient, Credentials, RequestBody};
use crate::error::ApiError;
use crate::study::EvaluationRequest;

impl ApiClient {
  /// Submit a recording for pronunciation scoring.
  ///
  /// Returns the raw response; `domain::evaluation::normalize` makes sense of it.
  pub async fn evaluate(
    &self,
    request: &EvaluationRequest,
    credentials: &Credentials,
  ) -> Result<Value, ApiError> {
    let path = "/speech/evaluate";
    let part = Part::bytes(request.clip.bytes.clone())
      .file_name(request.clip.file_name())
      .mime_str(&request.clip.mime)
      .or_else(|_| {
        Part::bytes(request.clip.bytes.clone())
          .file_name(request.clip.file_name())
          .mime_str("application/octet-stream")
      })
      .map_err(|e| ApiError::Malformed {
        path: path.to_string(),
        message: e.to_string(),
      })?;

    let form = Form::new()
      .part("audio", part)
      .text("text", request.target_text.clone())
      .text("user_id", request.user_id.clone())
      .text("word", request.word.clone());

    self.post(path, credentials, RequestBody::Multipart(form)).await
  }
}
