use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{segment, ApiClient, Credentials};
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub uid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub country: String,
  #[serde(default, alias = "daily_goal")]
  pub daily_goal: Option<u32>,
  #[serde(default, alias = "review_wrong")]
  pub review_wrong: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
  pub email: String,
  pub phone: String,
  pub country: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettings {
  pub daily_goal: u32,
  pub review_wrong: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicScore {
  pub name: String,
  #[serde(default)]
  pub score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserStats {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub total_learned: u32,
  #[serde(default)]
  pub chart_data: Vec<TopicScore>,
  #[serde(default)]
  pub goal: Option<u32>,
}

fn to_json<T: Serialize>(path: &str, value: &T) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(|e| ApiError::Malformed {
    path: path.to_string(),
    message: e.to_string(),
  })
}

impl ApiClient {
  pub async fn profile(&self, user_id: &str, credentials: &Credentials) -> Result<Profile, ApiError> {
    let path = format!("/user/{}/profile", segment(user_id));
    self.get(&path, &[], credentials).await
  }

  pub async fn update_profile(
    &self,
    user_id: &str,
    update: &ProfileUpdate,
    credentials: &Credentials,
  ) -> Result<(), ApiError> {
    let path = format!("/user/{}/profile", segment(user_id));
    let _: Value = self.put(&path, credentials, to_json(&path, update)?).await?;
    Ok(())
  }

  pub async fn update_settings(
    &self,
    user_id: &str,
    settings: &StudySettings,
    credentials: &Credentials,
  ) -> Result<(), ApiError> {
    let path = format!("/user/{}/settings", segment(user_id));
    let _: Value = self.put(&path, credentials, to_json(&path, settings)?).await?;
    Ok(())
  }

  pub async fn change_password(
    &self,
    user_id: &str,
    old_password: &str,
    new_password: &str,
    credentials: &Credentials,
  ) -> Result<(), ApiError> {
    let path = format!("/user/{}/password", segment(user_id));
    let body = json!({ "old_password": old_password, "new_password": new_password });
    let _: Value = self.put(&path, credentials, body).await?;
    Ok(())
  }

  /// Delete the account
  pub async fn withdraw(&self, user_id: &str, credentials: &Credentials) -> Result<(), ApiError> {
    let path = format!("/user/{}", segment(user_id));
    let _: Value = self.delete(&path, credentials).await?;
    Ok(())
  }

  pub async fn stats(&self, user_id: &str, credentials: &Credentials) -> Result<UserStats, ApiError> {
    let path = format!("/user/{}/stats", segment(user_id));
    self.get(&path, &[], credentials).await
  }
}
