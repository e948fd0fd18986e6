use serde::{Deserialize, Serialize};

/// Account role as reported by the backend at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  Teacher,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Teacher => "teacher",
      Self::Admin => "admin",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "student" => Some(Self::Student),
      "teacher" => Some(Self::Teacher),
      "admin" => Some(Self::Admin),
      _ => None,
    }
  }

  /// Display label for the navigation bar
  pub fn label(&self) -> &'static str {
    match self {
      Self::Student => "학생",
      Self::Teacher => "선생님",
      Self::Admin => "관리자",
    }
  }

  /// Page a user of this role lands on after login or a denied page
  pub fn landing_path(&self) -> &'static str {
    match self {
      Self::Student => "/student_home",
      Self::Teacher => "/teacher_dash",
      Self::Admin => "/system_dash",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_role_round_trip_strings() {
    for role in [Role::Student, Role::Teacher, Role::Admin] {
      assert_eq!(Role::from_str(role.as_str()), Some(role));
    }
    assert_eq!(Role::from_str(" Teacher "), Some(Role::Teacher));
    assert_eq!(Role::from_str("guest"), None);
  }

  #[test]
  fn test_landing_paths() {
    assert_eq!(Role::Student.landing_path(), "/student_home");
    assert_eq!(Role::Teacher.landing_path(), "/teacher_dash");
    assert_eq!(Role::Admin.landing_path(), "/system_dash");
  }

  #[test]
  fn test_role_deserializes_lowercase() {
    let role: Role = serde_json::from_str("\"admin\"").unwrap();
    assert_eq!(role, Role::Admin);
  }
}
