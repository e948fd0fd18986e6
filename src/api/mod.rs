//! Backend API client.
//!
//! Every backend call goes through [`ApiClient`]: one attempt, no caching,
//! credentials attached as a `Cookie` header. Typed wrappers for each backend
//! capability live in the submodules as further `impl ApiClient` blocks.

pub mod auth;
pub mod speech;
pub mod study;
pub mod teacher;
pub mod user;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::ApiError;

/// Backend session cookies, replayed on every call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
  cookies: Vec<(String, String)>,
}

impl Credentials {
  pub fn none() -> Self {
    Self::default()
  }

  pub fn from_pairs(cookies: Vec<(String, String)>) -> Self {
    Self { cookies }
  }

  pub fn is_empty(&self) -> bool {
    self.cookies.is_empty()
  }

  /// Value for a `Cookie` request header
  pub fn header_value(&self) -> Option<String> {
    if self.cookies.is_empty() {
      return None;
    }
    let parts: Vec<String> = self
      .cookies
      .iter()
      .map(|(name, value)| format!("{}={}", name, value))
      .collect();
    Some(parts.join("; "))
  }
}

/// Request payload
pub enum RequestBody {
  Json(Value),
  Multipart(Form),
}

/// Decoded backend response
#[derive(Debug)]
pub struct ApiResponse {
  pub status: u16,
  pub body: Value,
  /// Name/value pairs from `Set-Cookie` headers
  pub cookies: Vec<(String, String)>,
}

impl ApiResponse {
  pub fn decode<T: DeserializeOwned>(self, path: &str) -> Result<T, ApiError> {
    serde_json::from_value(self.body).map_err(|e| ApiError::Malformed {
      path: path.to_string(),
      message: e.to_string(),
    })
  }
}

/// Parse the name=value part of a `Set-Cookie` header
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
  let pair = header.split(';').next()?;
  let (name, value) = pair.split_once('=')?;
  let name = name.trim();
  if name.is_empty() {
    return None;
  }
  Some((name.to_string(), value.trim().to_string()))
}

#[derive(Debug, Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(Self {
      http: builder.build()?,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Send one request and decode the JSON body.
  ///
  /// Non-2xx answers become [`ApiError::Status`] carrying the parsed body,
  /// or the raw text as a JSON string when it is not JSON.
  pub async fn send(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, &str)],
    credentials: &Credentials,
    body: Option<RequestBody>,
  ) -> Result<ApiResponse, ApiError> {
    let url = format!("{}{}", self.base_url, path);
    let mut request = self.http.request(method.clone(), &url);
    if !query.is_empty() {
      request = request.query(query);
    }
    if let Some(cookie) = credentials.header_value() {
      request = request.header(COOKIE, cookie);
    }
    request = match body {
      Some(RequestBody::Json(json)) => request.json(&json),
      Some(RequestBody::Multipart(form)) => request.multipart(form),
      None => request,
    };

    tracing::debug!("{} {}", method, path);
    let response = request.send().await.map_err(|source| ApiError::Network {
      path: path.to_string(),
      source,
    })?;

    let status = response.status();
    let cookies: Vec<(String, String)> = response
      .headers()
      .get_all(SET_COOKIE)
      .iter()
      .filter_map(|v| v.to_str().ok())
      .filter_map(parse_set_cookie)
      .collect();
    let text = response.text().await.map_err(|source| ApiError::Network {
      path: path.to_string(),
      source,
    })?;

    let parsed = if text.trim().is_empty() {
      Ok(Value::Null)
    } else {
      serde_json::from_str::<Value>(&text)
    };

    if !status.is_success() {
      return Err(ApiError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        body: parsed.unwrap_or(Value::String(text)),
      });
    }

    let body = parsed.map_err(|e| ApiError::Malformed {
      path: path.to_string(),
      message: e.to_string(),
    })?;
    Ok(ApiResponse {
      status: status.as_u16(),
      body,
      cookies,
    })
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
    credentials: &Credentials,
  ) -> Result<T, ApiError> {
    self
      .send(Method::GET, path, query, credentials, None)
      .await?
      .decode(path)
  }

  pub async fn post<T: DeserializeOwned>(
    &self,
    path: &str,
    credentials: &Credentials,
    body: RequestBody,
  ) -> Result<T, ApiError> {
    self
      .send(Method::POST, path, &[], credentials, Some(body))
      .await?
      .decode(path)
  }

  pub async fn put<T: DeserializeOwned>(
    &self,
    path: &str,
    credentials: &Credentials,
    body: Value,
  ) -> Result<T, ApiError> {
    self
      .send(Method::PUT, path, &[], credentials, Some(RequestBody::Json(body)))
      .await?
      .decode(path)
  }

  pub async fn delete<T: DeserializeOwned>(
    &self,
    path: &str,
    credentials: &Credentials,
  ) -> Result<T, ApiError> {
    self
      .send(Method::DELETE, path, &[], credentials, None)
      .await?
      .decode(path)
  }
}

/// Percent-encode one path segment (user ids may contain anything)
pub(crate) fn segment(value: &str) -> String {
  urlencoding::encode(value).into_owned()
}
