//! Teacher dashboard: students, notices, per-student detail.

use askama::Template;
use axum::{
  extract::{Path, State},
  response::{Html, IntoResponse, Response},
  Form,
};
use serde::Deserialize;

use super::{api_alert, chrome, flash_redirect};
use crate::api::teacher::{NewNotice, Notice, ScorePoint, StudentDetail, StudentSummary};
use crate::auth::AuthContext;
use crate::domain::Role;
use crate::error::LogOnError;
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;
use crate::validation;

const STAFF: &[Role] = &[Role::Teacher, Role::Admin];

pub struct StudentRow {
  pub student: StudentSummary,
  pub avg_score: String,
  /// Progress in whole percent
  pub progress: i64,
}

impl From<StudentSummary> for StudentRow {
  fn from(student: StudentSummary) -> Self {
    Self {
      avg_score: format!("{:.1}", student.avg_score),
      progress: (student.progress_rate * 100.0).round().clamp(0.0, 100.0) as i64,
      student,
    }
  }
}

#[derive(Template)]
#[template(path = "teacher_dash.html")]
pub struct TeacherDashTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub students: Vec<StudentRow>,
  pub sent: Vec<Notice>,
}

pub struct ChartPoint {
  pub date: String,
  pub score: i64,
  pub height: i64,
}

impl From<&ScorePoint> for ChartPoint {
  fn from(point: &ScorePoint) -> Self {
    let score = point.score.round() as i64;
    Self {
      date: point.date.clone(),
      score,
      height: score.clamp(0, 100),
    }
  }
}

#[derive(Template)]
#[template(path = "teacher_student.html")]
pub struct TeacherStudentTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub uid: String,
  pub detail: Option<StudentDetail>,
  pub chart: Vec<ChartPoint>,
}

#[derive(Deserialize)]
pub struct NoticeForm {
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub content: String,
  /// datetime-local value; empty publishes immediately
  #[serde(default)]
  pub scheduled_at: String,
}

/// GET /teacher_dash
pub async fn teacher_dash(State(state): State<AppState>, auth: AuthContext) -> Response {
  if let Err(response) = auth.require(&state, STAFF) {
    return response;
  }
  let (nav, mut alert) = chrome(&state, &auth, "/teacher_dash");
  let credentials = auth.credentials();

  let students = match state.api.students(&credentials).await {
    Ok(students) => students.into_iter().map(StudentRow::from).collect(),
    Err(e) => {
      alert = Some(api_alert(&e, "Student list fetch failed"));
      Vec::new()
    }
  };
  let sent = state
    .api
    .notice_logs(&credentials)
    .await
    .log_warn_default("Notice log fetch failed");

  let template = TeacherDashTemplate {
    nav,
    alert,
    students,
    sent,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /teacher_dash/notice
pub async fn send_notice(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<NoticeForm>,
) -> Response {
  if let Err(response) = auth.require(&state, STAFF) {
    return response;
  }
  let valid = match validation::validate_notice(&form.title, &form.content, &form.scheduled_at) {
    Ok(valid) => valid,
    Err(e) => return flash_redirect(&state, &auth, Alert::warning(e.to_string()), "/teacher_dash"),
  };
  let notice = NewNotice {
    title: valid.title,
    content: valid.content,
    scheduled_at: valid.scheduled_at,
  };
  let alert = match state.api.send_notice(&notice, &auth.credentials()).await {
    Ok(()) => {
      tracing::info!("{} sent notice {:?}", auth.user.user_id, notice.title);
      match &notice.scheduled_at {
        Some(at) => Alert::success(format!("Notice scheduled for {}.", at)),
        None => Alert::success("Notice sent."),
      }
    }
    Err(e) => api_alert(&e, "Sending notice failed"),
  };
  flash_redirect(&state, &auth, alert, "/teacher_dash")
}

/// GET /teacher_student/{uid}
pub async fn teacher_student(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(uid): Path<String>,
) -> Response {
  if let Err(response) = auth.require(&state, STAFF) {
    return response;
  }
  let path = format!("/teacher_student/{}", uid);
  let (nav, mut alert) = chrome(&state, &auth, &path);
  let credentials = auth.credentials();

  let detail = match state.api.student_detail(&uid, &credentials).await {
    Ok(detail) => Some(detail),
    Err(e) => {
      alert = Some(api_alert(&e, "Student detail fetch failed"));
      None
    }
  };
  let chart = state
    .api
    .student_stats(&uid, &credentials)
    .await
    .log_warn_default("Student stats fetch failed")
    .iter()
    .map(ChartPoint::from)
    .collect();

  let template = TeacherStudentTemplate {
    nav,
    alert,
    uid,
    detail,
    chart,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /teacher_student/{uid}/reset-password
pub async fn reset_student_password(
  State(state): State<AppState>,
  auth: AuthContext,
  Path(uid): Path<String>,
) -> Response {
  if let Err(response) = auth.require(&state, STAFF) {
    return response;
  }
  let alert = match state.api.reset_student_password(&uid, &auth.credentials()).await {
    Ok(()) => {
      tracing::info!("{} reset the password of {}", auth.user.user_id, uid);
      Alert::success("Password reset. The student's new password was issued by the server.")
    }
    Err(e) => api_alert(&e, "Password reset failed"),
  };
  flash_redirect(&state, &auth, alert, &format!("/teacher_student/{}", uid))
}
