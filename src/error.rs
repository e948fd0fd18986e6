//! Error types shared across the portal.
//!
//! Backend calls fail with [`ApiError`]; handlers decide how loudly to log and
//! what to show the user based on its [`ErrorClass`].

use serde_json::Value;
use thiserror::Error;

/// Coarse classification used for alerting and log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caught before any network call (missing fields, password mismatch)
    Validation,
    /// Backend said no (4xx): bad credentials, duplicate id, pending approval
    Rejected,
    /// 5xx, unreachable backend, malformed JSON
    Unexpected,
}

/// Errors raised by the backend API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {path} failed with status {status}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: Value,
    },

    #[error("Network error on {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response from {path}: {message}")]
    Malformed { path: String, message: String },
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Status { status, .. } if (400..500).contains(status) => ErrorClass::Rejected,
            _ => ErrorClass::Unexpected,
        }
    }

    /// HTTP status when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Backend-provided reason (`detail` or `error` field), if any.
    pub fn detail(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        match body {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => ["detail", "error", "message"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string),
            _ => None,
        }
    }

    /// Message suitable for an alert. Rejections show the backend's reason,
    /// everything else gets a generic message.
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::Rejected => self
                .detail()
                .unwrap_or_else(|| "The request was rejected.".to_string()),
            _ => "Could not reach the server. Please try again.".to_string(),
        }
    }

    /// Log at a severity matching the error class.
    pub fn log(&self, context: &str) {
        match self.class() {
            ErrorClass::Rejected => tracing::warn!("{}: {}", context, self),
            _ => tracing::error!("{}: {}", context, self),
        }
    }
}

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
    /// Log the error at warn level and return the default
    fn log_warn_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }

    fn log_warn_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                T::default()
            }
        }
    }
}
