use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiClient, Credentials, RequestBody};
use crate::domain::Role;
use crate::error::ApiError;

/// Account as returned by `/auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
  pub uid: String,
  pub role: Role,
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
  user: BackendUser,
}

/// Successful login: the account plus the backend's session cookies
#[derive(Debug, Clone)]
pub struct LoginSuccess {
  pub user: BackendUser,
  pub cookies: Vec<(String, String)>,
}

/// Signup form as sent to `/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
  pub id: String,
  pub password: String,
  pub name: String,
  pub email: String,
  pub phone: String,
  pub country: String,
  pub role: Role,
}

#[derive(Debug, Deserialize)]
struct IdCheckReply {
  available: bool,
}

impl ApiClient {
  pub async fn login(&self, id: &str, password: &str) -> Result<LoginSuccess, ApiError> {
    let path = "/auth/login";
    let body = json!({ "id": id, "password": password });
    let response = self
      .send(
        Method::POST,
        path,
        &[],
        &Credentials::none(),
        Some(RequestBody::Json(body)),
      )
      .await?;
    let cookies = response.cookies.clone();
    let reply: LoginReply = response.decode(path)?;
    Ok(LoginSuccess {
      user: reply.user,
      cookies,
    })
  }

  pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
    let body = serde_json::to_value(registration).map_err(|e| ApiError::Malformed {
      path: "/auth/register".to_string(),
      message: e.to_string(),
    })?;
    let _: Value = self
      .post("/auth/register", &Credentials::none(), RequestBody::Json(body))
      .await?;
    Ok(())
  }

  /// Whether an account id is still free
  pub async fn check_id(&self, id: &str) -> Result<bool, ApiError> {
    let reply: IdCheckReply = self
      .post(
        "/auth/check-id",
        &Credentials::none(),
        RequestBody::Json(json!({ "id": id })),
      )
      .await?;
    Ok(reply.available)
  }
}
