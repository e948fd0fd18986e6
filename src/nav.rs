//! Navigation shell: top bar and role-dependent bottom bar.

use crate::domain::Role;
use crate::session::SessionContext;

/// Paths that render without any navigation chrome
const BARE_PATHS: &[&str] = &["/", "/login", "/signup"];

#[derive(Debug, Clone, PartialEq)]
pub struct NavItem {
  pub label: &'static str,
  pub href: &'static str,
  pub active: bool,
}

/// Navigation data every page template receives as `nav`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavContext {
  pub visible: bool,
  pub user_id: String,
  pub role_label: String,
  pub level: Option<String>,
  pub items: Vec<NavItem>,
}

fn menu(role: Role) -> &'static [(&'static str, &'static str)] {
  match role {
    Role::Student => &[
      ("홈", "/student_home"),
      ("레벨", "/level_select"),
      ("통계", "/stats"),
      ("설정", "/settings"),
    ],
    Role::Teacher => &[
      ("대시보드", "/teacher_dash"),
      ("공지", "/notices"),
      ("설정", "/settings"),
    ],
    Role::Admin => &[
      ("시스템", "/system_dash"),
      ("공지", "/notices"),
      ("설정", "/settings"),
    ],
  }
}

/// Pages reached from a menu entry highlight that entry
fn section_of(path: &str) -> &str {
  if path.starts_with("/study") {
    "/level_select"
  } else if path.starts_with("/teacher_student") {
    "/teacher_dash"
  } else if path == "/profile" {
    "/settings"
  } else {
    path
  }
}

impl NavContext {
  pub fn hidden() -> Self {
    Self::default()
  }

  pub fn for_path(context: Option<&SessionContext>, path: &str) -> Self {
    let Some(context) = context else {
      return Self::hidden();
    };
    if BARE_PATHS.contains(&path) {
      return Self::hidden();
    }

    let section = section_of(path);
    let items = menu(context.role)
      .iter()
      .map(|(label, href)| NavItem {
        label,
        href,
        active: section == *href,
      })
      .collect();

    Self {
      visible: true,
      user_id: context.user_id.clone(),
      role_label: context.role.label().to_string(),
      level: context.level.clone(),
      items,
    }
  }

  pub fn active_label(&self) -> Option<&'static str> {
    self.items.iter().find(|item| item.active).map(|item| item.label)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn context(role: Role) -> SessionContext {
    SessionContext {
      user_id: "someone".to_string(),
      role,
      name: String::new(),
      backend_cookies: vec![],
      level: Some("초급1".to_string()),
    }
  }

  #[test]
  fn test_hidden_on_bare_paths() {
    let student = context(Role::Student);
    for path in ["/", "/login", "/signup"] {
      assert!(!NavContext::for_path(Some(&student), path).visible, "{}", path);
    }
    assert!(!NavContext::for_path(None, "/stats").visible);
  }

  #[test]
  fn test_student_menu() {
    let nav = NavContext::for_path(Some(&context(Role::Student)), "/stats");
    assert!(nav.visible);
    let labels: Vec<&str> = nav.items.iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["홈", "레벨", "통계", "설정"]);
    assert_eq!(nav.active_label(), Some("통계"));
    assert_eq!(nav.level.as_deref(), Some("초급1"));
  }

  #[test]
  fn test_study_pages_highlight_levels() {
    let nav = NavContext::for_path(Some(&context(Role::Student)), "/study/vocabulary");
    assert_eq!(nav.active_label(), Some("레벨"));
  }

  #[test]
  fn test_teacher_and_admin_menus() {
    let teacher = NavContext::for_path(Some(&context(Role::Teacher)), "/teacher_student/student1");
    let labels: Vec<&str> = teacher.items.iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["대시보드", "공지", "설정"]);
    assert_eq!(teacher.active_label(), Some("대시보드"));

    let admin = NavContext::for_path(Some(&context(Role::Admin)), "/notices");
    let labels: Vec<&str> = admin.items.iter().map(|i| i.label).collect();
    assert_eq!(labels, vec!["시스템", "공지", "설정"]);
    assert_eq!(admin.active_label(), Some("공지"));
  }
}
