//! Form validation done before any backend call.
//!
//! Each validator returns the cleaned-up values the handler should send, or a
//! [`ValidationError`] that is shown to the user as-is.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::Role;

pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_DAILY_GOAL: u32 = 100;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
  #[error("{0} is required.")]
  Required(&'static str),

  #[error("Password must be at least {MIN_PASSWORD_LEN} characters.")]
  PasswordTooShort,

  #[error("Passwords do not match.")]
  PasswordMismatch,

  #[error("Please enter a valid email address.")]
  InvalidEmail,

  #[error("Daily goal must be between 1 and {MAX_DAILY_GOAL}.")]
  GoalOutOfRange,

  #[error("Scheduled time must look like 2025-03-01T09:00.")]
  InvalidSchedule,

  #[error("Please check whether the ID is available first.")]
  IdNotChecked,
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(ValidationError::Required(field))
  } else {
    Ok(trimmed)
  }
}

fn check_email(email: &str) -> Result<(), ValidationError> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
    _ => Err(ValidationError::InvalidEmail),
  }
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
  if password.is_empty() {
    return Err(ValidationError::Required("Password"));
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError::PasswordTooShort);
  }
  if password != confirm {
    return Err(ValidationError::PasswordMismatch);
  }
  Ok(())
}

/// Returns the trimmed id
pub fn validate_login(id: &str, password: &str) -> Result<String, ValidationError> {
  let id = required(id, "ID")?;
  if password.is_empty() {
    return Err(ValidationError::Required("Password"));
  }
  Ok(id.to_string())
}

/// Signup fields as submitted
#[derive(Debug, Clone, Default)]
pub struct SignupInput<'a> {
  pub id: &'a str,
  pub password: &'a str,
  pub password_confirm: &'a str,
  pub name: &'a str,
  pub email: &'a str,
  pub phone: &'a str,
  pub country: &'a str,
  pub is_teacher: bool,
  /// The id the availability check last succeeded for
  pub checked_id: Option<&'a str>,
}

/// Cleaned signup values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSignup {
  pub id: String,
  pub password: String,
  pub name: String,
  pub email: String,
  pub phone: String,
  pub country: String,
  pub role: Role,
}

pub fn validate_signup(input: &SignupInput<'_>) -> Result<ValidSignup, ValidationError> {
  let name = required(input.name, "Name")?;
  let id = required(input.id, "ID")?;
  if input.checked_id.map(str::trim) != Some(id) {
    return Err(ValidationError::IdNotChecked);
  }
  check_new_password(input.password, input.password_confirm)?;
  let email = required(input.email, "Email")?;
  check_email(email)?;

  Ok(ValidSignup {
    id: id.to_string(),
    password: input.password.to_string(),
    name: name.to_string(),
    email: email.to_string(),
    phone: input.phone.trim().to_string(),
    country: input.country.trim().to_string(),
    role: if input.is_teacher { Role::Teacher } else { Role::Student },
  })
}

pub fn validate_password_change(old: &str, new: &str, confirm: &str) -> Result<(), ValidationError> {
  if old.is_empty() {
    return Err(ValidationError::Required("Current password"));
  }
  check_new_password(new, confirm)
}

/// Email may be left empty; when given it must look like one
pub fn validate_profile(email: &str) -> Result<(), ValidationError> {
  let email = email.trim();
  if email.is_empty() {
    Ok(())
  } else {
    check_email(email)
  }
}

pub fn validate_daily_goal(goal: u32) -> Result<u32, ValidationError> {
  if (1..=MAX_DAILY_GOAL).contains(&goal) {
    Ok(goal)
  } else {
    Err(ValidationError::GoalOutOfRange)
  }
}

/// Cleaned notice values
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNotice {
  pub title: String,
  pub content: String,
  pub scheduled_at: Option<String>,
}

/// `scheduled_at` comes from a datetime-local input; empty means publish now
pub fn validate_notice(
  title: &str,
  content: &str,
  scheduled_at: &str,
) -> Result<ValidNotice, ValidationError> {
  let title = required(title, "Title")?;
  let content = required(content, "Content")?;
  let scheduled_at = match scheduled_at.trim() {
    "" => None,
    raw => {
      let parsed = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidSchedule)?;
      Some(parsed.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
  };
  Ok(ValidNotice {
    title: title.to_string(),
    content: content.to_string(),
    scheduled_at,
  })
}
