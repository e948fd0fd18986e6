//! In-memory session storage.
//!
//! Each browser gets a random session id (cookie) that maps to who is signed
//! in, at most one live study session, and a one-shot flash alert.
//! Entries auto-expire after a configurable duration of inactivity.

use crate::api::Credentials;
use crate::config;
use crate::domain::Role;
use crate::error::ErrorClass;
use crate::study::StudySession;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Who is signed in on this browser
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
  pub user_id: String,
  pub role: Role,
  pub name: String,
  /// Cookies the backend set at login
  pub backend_cookies: Vec<(String, String)>,
  /// Level of the most recent study session
  pub level: Option<String>,
}

impl SessionContext {
  pub fn credentials(&self) -> Credentials {
    Credentials::from_pairs(self.backend_cookies.clone())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
  Success,
  Info,
  Warning,
  Error,
}

impl AlertLevel {
  /// CSS class suffix
  pub fn as_str(&self) -> &'static str {
    match self {
      AlertLevel::Success => "success",
      AlertLevel::Info => "info",
      AlertLevel::Warning => "warning",
      AlertLevel::Error => "error",
    }
  }
}

/// Message shown at the top of the next rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
  pub level: AlertLevel,
  pub message: String,
}

impl Alert {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: AlertLevel::Success, message: message.into() }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self { level: AlertLevel::Info, message: message.into() }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self { level: AlertLevel::Warning, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: AlertLevel::Error, message: message.into() }
  }

  /// Validation problems and rejections are warnings; the rest are errors
  pub fn for_class(class: ErrorClass, message: impl Into<String>) -> Self {
    match class {
      ErrorClass::Validation | ErrorClass::Rejected => Self::warning(message),
      ErrorClass::Unexpected => Self::error(message),
    }
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  context: SessionContext,
  study: Option<StudySession>,
  flash: Option<Alert>,
  last_access: DateTime<Utc>,
}

/// Shared session store, cloned into every handler through `AppState`
#[derive(Clone)]
pub struct SessionStore {
  entries: Arc<Mutex<HashMap<String, SessionEntry>>>,
  expiry: Duration,
}

impl SessionStore {
  pub fn new(expiry_hours: i64) -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      expiry: Duration::hours(expiry_hours),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    // A panic mid-update leaves plain data behind; keep serving it
    self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Look up a live entry, refreshing its access time
  fn live<'a>(
    &self,
    entries: &'a mut HashMap<String, SessionEntry>,
    session_id: &str,
  ) -> Option<&'a mut SessionEntry> {
    let now = Utc::now();
    let expired = entries
      .get(session_id)
      .is_some_and(|entry| entry.last_access <= now - self.expiry);
    if expired {
      entries.remove(session_id);
      return None;
    }
    let entry = entries.get_mut(session_id)?;
    entry.last_access = now;
    Some(entry)
  }

  /// Store a freshly signed-in context under a new session id
  pub fn create(&self, context: SessionContext) -> String {
    let session_id = generate_session_id();
    let mut entries = self.lock();

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      self.cleanup_expired(&mut entries);
    }

    entries.insert(
      session_id.clone(),
      SessionEntry {
        context,
        study: None,
        flash: None,
        last_access: Utc::now(),
      },
    );
    session_id
  }

  pub fn context(&self, session_id: &str) -> Option<SessionContext> {
    let mut entries = self.lock();
    self.live(&mut entries, session_id).map(|entry| entry.context.clone())
  }

  pub fn update_context<F: FnOnce(&mut SessionContext)>(&self, session_id: &str, f: F) {
    let mut entries = self.lock();
    if let Some(entry) = self.live(&mut entries, session_id) {
      f(&mut entry.context);
    }
  }

  pub fn remove(&self, session_id: &str) {
    self.lock().remove(session_id);
  }

  pub fn set_flash(&self, session_id: &str, alert: Alert) {
    let mut entries = self.lock();
    if let Some(entry) = self.live(&mut entries, session_id) {
      entry.flash = Some(alert);
    }
  }

  /// Returns the pending alert at most once
  pub fn take_flash(&self, session_id: &str) -> Option<Alert> {
    let mut entries = self.lock();
    self.live(&mut entries, session_id)?.flash.take()
  }

  /// Run `f` against this browser's study slot while holding the lock.
  ///
  /// `f` must not block; returns `None` when the session is gone.
  pub fn with_study<R, F>(&self, session_id: &str, f: F) -> Option<R>
  where
    F: FnOnce(&mut Option<StudySession>) -> R,
  {
    let mut entries = self.lock();
    self.live(&mut entries, session_id).map(|entry| f(&mut entry.study))
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clean up expired sessions
  fn cleanup_expired(&self, entries: &mut HashMap<String, SessionEntry>) {
    let cutoff = Utc::now() - self.expiry;
    let before = entries.len();
    entries.retain(|_, entry| entry.last_access > cutoff);
    let removed = before - entries.len();
    if removed > 0 {
      tracing::debug!("Swept {} expired sessions", removed);
    }
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::study::StudyRules;
  use crate::testing::sample_words;

  fn student() -> SessionContext {
    SessionContext {
      user_id: "student1".to_string(),
      role: Role::Student,
      name: "김학생".to_string(),
      backend_cookies: vec![("backend_session".to_string(), "tok-student1".to_string())],
      level: None,
    }
  }

  #[test]
  fn test_session_id_shape() {
    let id = generate_session_id();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    assert_ne!(id, generate_session_id());
  }

  #[test]
  fn test_create_lookup_remove() {
    let store = SessionStore::new(24);
    let id = store.create(student());
    let context = store.context(&id).unwrap();
    assert_eq!(context.user_id, "student1");
    assert_eq!(
      context.credentials().header_value().as_deref(),
      Some("backend_session=tok-student1")
    );

    store.remove(&id);
    assert!(store.context(&id).is_none());
    assert!(store.is_empty());
  }

  #[test]
  fn test_flash_is_one_shot() {
    let store = SessionStore::new(24);
    let id = store.create(student());
    store.set_flash(&id, Alert::warning("Students only."));
    assert_eq!(store.take_flash(&id), Some(Alert::warning("Students only.")));
    assert_eq!(store.take_flash(&id), None);
  }

  #[test]
  fn test_expired_entries_are_dropped() {
    let store = SessionStore::new(0);
    let id = store.create(student());
    assert!(store.context(&id).is_none());
    assert!(store.is_empty());
  }

  #[test]
  fn test_study_slot() {
    let store = SessionStore::new(24);
    let id = store.create(student());
    assert_eq!(store.with_study(&id, |slot| slot.is_some()), Some(false));

    store.with_study(&id, |slot| {
      *slot = StudySession::new("초급1", "student1", sample_words(), vec![], StudyRules::default()).ok();
    });
    let level = store.with_study(&id, |slot| slot.as_ref().map(|s| s.level().to_string()));
    assert_eq!(level, Some(Some("초급1".to_string())));

    assert_eq!(store.with_study("unknown", |_| ()), None);
  }

  #[test]
  fn test_alert_for_class() {
    assert_eq!(Alert::for_class(ErrorClass::Rejected, "x").level, AlertLevel::Warning);
    assert_eq!(Alert::for_class(ErrorClass::Unexpected, "x").level, AlertLevel::Error);
  }
}
