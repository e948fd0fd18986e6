//! Teacher and admin endpoints, plus the shared notice board.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{segment, ApiClient, Credentials, RequestBody};
use crate::error::ApiError;

/// Row of the teacher's student list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentSummary {
  pub uid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub country: String,
  #[serde(default)]
  pub current_level: String,
  #[serde(default)]
  pub current_page: u32,
  #[serde(default)]
  pub avg_score: f64,
  /// 0.0 to 1.0
  #[serde(default)]
  pub progress_rate: f64,
}

#[derive(Debug, Deserialize)]
struct StudentList {
  #[serde(default)]
  ok: bool,
  #[serde(default)]
  items: Vec<StudentSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentInfo {
  pub uid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub country: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentProgress {
  #[serde(default)]
  pub level: String,
  #[serde(default)]
  pub current_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentDetail {
  pub info: StudentInfo,
  #[serde(default)]
  pub progress: StudentProgress,
}

/// One point of a student's score history
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScorePoint {
  pub date: String,
  #[serde(default)]
  pub score: f64,
}

#[derive(Debug, Deserialize)]
struct StatsReply {
  #[serde(default)]
  ok: bool,
  #[serde(default)]
  chart_data: Vec<ScorePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewNotice {
  pub title: String,
  pub content: String,
  /// Publish time; immediately when absent
  pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notice {
  #[serde(default)]
  pub id: Option<i64>,
  pub title: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub scheduled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingTeacher {
  pub uid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub created_at: Option<String>,
}

impl ApiClient {
  pub async fn students(&self, credentials: &Credentials) -> Result<Vec<StudentSummary>, ApiError> {
    let list: StudentList = self.get("/api/teacher/students", &[], credentials).await?;
    Ok(if list.ok { list.items } else { Vec::new() })
  }

  pub async fn student_detail(
    &self,
    uid: &str,
    credentials: &Credentials,
  ) -> Result<StudentDetail, ApiError> {
    let path = format!("/api/teacher/student/{}", segment(uid));
    self.get(&path, &[], credentials).await
  }

  pub async fn student_stats(
    &self,
    uid: &str,
    credentials: &Credentials,
  ) -> Result<Vec<ScorePoint>, ApiError> {
    let path = format!("/api/teacher/students/{}/stats", segment(uid));
    let reply: StatsReply = self.get(&path, &[], credentials).await?;
    Ok(if reply.ok { reply.chart_data } else { Vec::new() })
  }

  pub async fn send_notice(&self, notice: &NewNotice, credentials: &Credentials) -> Result<(), ApiError> {
    let body = json!({
      "title": notice.title,
      "content": notice.content,
      "scheduled_at": notice.scheduled_at,
    });
    let _: Value = self
      .post("/api/teacher/notice", credentials, RequestBody::Json(body))
      .await?;
    Ok(())
  }

  /// Published notices, newest first
  pub async fn notices(&self, credentials: &Credentials) -> Result<Vec<Notice>, ApiError> {
    let mut notices: Vec<Notice> = self.get("/api/notice/list", &[], credentials).await?;
    sort_newest_first(&mut notices);
    Ok(notices)
  }

  /// Notices sent by teachers, including scheduled ones
  pub async fn notice_logs(&self, credentials: &Credentials) -> Result<Vec<Notice>, ApiError> {
    let mut notices: Vec<Notice> = self.get("/api/notice/logs", &[], credentials).await?;
    sort_newest_first(&mut notices);
    Ok(notices)
  }

  pub async fn reset_student_password(&self, uid: &str, credentials: &Credentials) -> Result<(), ApiError> {
    let path = format!("/api/teacher/students/{}/reset-password", segment(uid));
    let _: Value = self
      .post(&path, credentials, RequestBody::Json(json!({})))
      .await?;
    Ok(())
  }

  pub async fn pending_teachers(&self, credentials: &Credentials) -> Result<Vec<PendingTeacher>, ApiError> {
    self.get("/admin/pending_teachers", &[], credentials).await
  }

  pub async fn approve_teacher(&self, uid: &str, credentials: &Credentials) -> Result<(), ApiError> {
    let path = format!("/admin/approve/{}", segment(uid));
    let _: Value = self
      .post(&path, credentials, RequestBody::Json(json!({})))
      .await?;
    Ok(())
  }
}

/// ISO-8601 timestamps sort lexically
pub fn sort_newest_first(notices: &mut [Notice]) {
  notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::FakeBackend;

  fn notice(title: &str, created_at: &str) -> Notice {
    Notice {
      id: None,
      title: title.to_string(),
      content: String::new(),
      created_at: created_at.to_string(),
      author: None,
      scheduled_at: None,
    }
  }

  #[test]
  fn test_sort_newest_first() {
    let mut notices = vec![
      notice("old", "2025-01-01T09:00:00"),
      notice("new", "2025-03-01T09:00:00"),
      notice("mid", "2025-02-01T09:00:00"),
    ];
    sort_newest_first(&mut notices);
    let titles: Vec<&str> = notices.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["new", "mid", "old"]);
  }

  #[tokio::test]
  async fn test_students_unwraps_items() {
    let backend = FakeBackend::start().await.unwrap();
    let students = backend.client().students(&Credentials::none()).await.unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].uid, "student1");
    assert_eq!(students[0].avg_score, 82.5);
  }

  #[tokio::test]
  async fn test_notices_sorted() {
    let backend = FakeBackend::start().await.unwrap();
    let notices = backend.client().notices(&Credentials::none()).await.unwrap();
    assert_eq!(notices[0].title, "기말 시험 안내");
  }

  #[tokio::test]
  async fn test_send_notice_and_approve() {
    let backend = FakeBackend::start().await.unwrap();
    let client = backend.client();
    client
      .send_notice(
        &NewNotice {
          title: "공지".to_string(),
          content: "내용".to_string(),
          scheduled_at: None,
        },
        &Credentials::none(),
      )
      .await
      .unwrap();
    assert_eq!(backend.sent_notices(), vec!["공지".to_string()]);

    client.approve_teacher("teacher2", &Credentials::none()).await.unwrap();
    assert!(client
      .pending_teachers(&Credentials::none())
      .await
      .unwrap()
      .is_empty());
  }
}
