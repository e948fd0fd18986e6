//! Test utilities: an in-process fake of the backend REST API.
//!
//! Serves canned fixtures on an ephemeral localhost port and records what the
//! portal sent (completions, uploads, notices) so tests can assert on it.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::ApiClient;
use crate::config::{AppConfig, BackendConfig};
use crate::domain::word::{to_study_items, WordRecord};
use crate::domain::StudyItem;

/// Password every fixture account uses
pub const FIXTURE_PASSWORD: &str = "pw1234";

/// Level whose word list is empty
pub const EMPTY_LEVEL: &str = "고급2";

/// One recorded `/speech/evaluate` upload
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub text: String,
    pub word: String,
    pub user_id: String,
    pub audio_len: usize,
}

#[derive(Debug, Default)]
struct Recorded {
    completions: Vec<(String, String)>,
    uploads: Vec<Upload>,
    notices: Vec<String>,
    approved: Vec<String>,
    withdrawn: Vec<String>,
    password_resets: Vec<String>,
    /// Overrides the default evaluation answer: (status, body)
    evaluation_reply: Option<(u16, Value)>,
    /// Paths that answer 500
    failing: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeState {
    recorded: Arc<Mutex<Recorded>>,
}

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fails(&self, path: &str) -> bool {
        self.lock().failing.iter().any(|p| p == path)
    }
}

/// Handle to a running fake backend. The server lives as long as the runtime.
pub struct FakeBackend {
    addr: SocketAddr,
    state: FakeState,
}

impl FakeBackend {
    pub async fn start() -> std::io::Result<Self> {
        let state = FakeState::default();
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Fake backend stopped: {}", e);
            }
        });
        Ok(Self { addr, state })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.backend_config()).unwrap_or_else(|e| panic!("HTTP client: {}", e))
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.url(),
            timeout_secs: Some(5),
        }
    }

    /// Default configuration pointed at this backend
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            backend: self.backend_config(),
            ..AppConfig::default()
        }
    }

    pub fn completions(&self) -> Vec<(String, String)> {
        self.state.lock().completions.clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().uploads.clone()
    }

    pub fn sent_notices(&self) -> Vec<String> {
        self.state.lock().notices.clone()
    }

    pub fn withdrawn(&self) -> Vec<String> {
        self.state.lock().withdrawn.clone()
    }

    pub fn password_resets(&self) -> Vec<String> {
        self.state.lock().password_resets.clone()
    }

    /// Answer the next evaluations with a fixed status and body
    pub fn set_evaluation_reply(&self, status: u16, body: Value) {
        self.state.lock().evaluation_reply = Some((status, body));
    }

    /// Make a path answer 500 from now on
    pub fn fail(&self, path: &str) {
        self.state.lock().failing.push(path.to_string());
    }
}

// ==================== Fixtures ====================

const WORDS: [(&str, &str, &str, &str); 10] = [
    ("사과", "과일", "apple", "사과를 먹어요."),
    ("바나나", "과일", "banana", "바나나가 길어요."),
    ("포도", "과일", "grape", "포도가 달아요."),
    ("학교", "장소", "school", "학교에 가요."),
    ("선생님", "사람", "teacher", "선생님이 친절해요."),
    ("친구", "사람", "friend", "친구를 만나요."),
    ("물", "음식", "water", "물을 마셔요."),
    ("밥", "음식", "rice", "밥을 먹어요."),
    ("책", "물건", "book", "책을 읽어요."),
    ("집", "장소", "house", "집에 가요."),
];

fn word_records_json() -> Value {
    let words: Vec<Value> = WORDS
        .iter()
        .enumerate()
        .map(|(i, (word, meaning, eng, example))| {
            json!({
                "id": i + 1,
                "word": word,
                "meaning": meaning,
                "eng_meaning": eng,
                "example": example,
                "audio_path": format!("Level1_{}", i + 1),
            })
        })
        .collect();
    Value::Array(words)
}

/// The ten fixture words as study items
pub fn sample_words() -> Vec<StudyItem> {
    let records: Vec<WordRecord> = serde_json::from_value(word_records_json()).unwrap_or_default();
    to_study_items(records)
}

fn quiz_json() -> Value {
    json!([
        {"question": "'apple'은 한국어로?", "options": ["사과", "바나나", "포도"], "answer": "사과"}
    ])
}

/// Successful scoring answer for `text`, in the backend's nested shape
pub fn evaluation_json(text: &str, score: f64) -> Value {
    json!({
        "success": true,
        "score": score,
        "result": {
            "quality": {
                "sentences": [
                    {"text": "!SIL", "score": 0.0, "words": []},
                    {
                        "text": text,
                        "score": score,
                        "words": [{
                            "text": text,
                            "score": score,
                            "syll": [{"text": text, "score": score, "phones": [
                                {"symbol": "s", "score": score}
                            ]}]
                        }]
                    }
                ]
            },
            "fluency": {"speech rate": 2.1, "correct syllable count": 5, "syllable count": 6}
        }
    })
}

struct Account {
    name: &'static str,
    role: &'static str,
    approved: bool,
}

fn accounts() -> HashMap<&'static str, Account> {
    HashMap::from([
        ("student1", Account { name: "김학생", role: "student", approved: true }),
        ("student2", Account { name: "이학생", role: "student", approved: true }),
        ("teacher1", Account { name: "박선생", role: "teacher", approved: true }),
        ("teacher2", Account { name: "최선생", role: "teacher", approved: false }),
        ("admin", Account { name: "관리자", role: "admin", approved: true }),
    ])
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn server_error() -> Response {
    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

// ==================== Routes ====================

fn router(state: FakeState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/check-id", post(check_id))
        .route("/study/words", get(words))
        .route("/study/review-words", get(review_words))
        .route("/study/quiz", get(quiz))
        .route("/study/current-progress", get(current_progress))
        .route("/study/complete", post(complete))
        .route("/speech/evaluate", post(evaluate))
        .route("/user/{id}/profile", get(profile).put(ack))
        .route("/user/{id}/settings", put(ack))
        .route("/user/{id}/password", put(change_password))
        .route("/user/{id}/stats", get(user_stats))
        .route("/user/{id}", delete(withdraw))
        .route("/api/teacher/students", get(students))
        .route("/api/teacher/student/{uid}", get(student_detail))
        .route("/api/teacher/students/{uid}/stats", get(student_stats))
        .route("/api/teacher/students/{uid}/reset-password", post(reset_password))
        .route("/api/teacher/notice", post(send_notice))
        .route("/api/notice/list", get(notice_list))
        .route("/api/notice/logs", get(notice_logs))
        .route("/admin/pending_teachers", get(pending_teachers))
        .route("/admin/approve/{uid}", post(approve))
        .route("/echo/cookie", get(echo_cookie))
        .with_state(state)
}

async fn login(Json(body): Json<Value>) -> Response {
    let id = body["id"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let accounts = accounts();
    let Some(account) = accounts.get(id) else {
        return detail(StatusCode::UNAUTHORIZED, "아이디가 존재하지 않습니다.");
    };
    if password != FIXTURE_PASSWORD {
        return detail(StatusCode::UNAUTHORIZED, "비밀번호가 일치하지 않습니다.");
    }
    if !account.approved {
        return detail(StatusCode::FORBIDDEN, "승인 대기 중인 계정입니다.");
    }
    let cookie = format!("backend_session=tok-{}; Path=/; HttpOnly", id);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "status": "ok",
            "user": {"uid": id, "role": account.role, "name": account.name}
        })),
    )
        .into_response()
}

async fn register(Json(body): Json<Value>) -> Response {
    let id = body["id"].as_str().unwrap_or_default();
    if accounts().contains_key(id) {
        return detail(StatusCode::BAD_REQUEST, "이미 존재하는 아이디입니다.");
    }
    Json(json!({"status": "ok"})).into_response()
}

async fn check_id(Json(body): Json<Value>) -> Json<Value> {
    let id = body["id"].as_str().unwrap_or_default();
    Json(json!({ "available": !accounts().contains_key(id) }))
}

async fn words(State(state): State<FakeState>, Query(query): Query<HashMap<String, String>>) -> Response {
    if state.fails("/study/words") {
        return server_error();
    }
    if query.get("level").map(String::as_str) == Some(EMPTY_LEVEL) {
        return Json(json!([])).into_response();
    }
    Json(word_records_json()).into_response()
}

async fn review_words(State(state): State<FakeState>) -> Response {
    if state.fails("/study/review-words") {
        return server_error();
    }
    let all = word_records_json();
    let weak: Vec<Value> = all.as_array().map(|a| a[..2].to_vec()).unwrap_or_default();
    Json(Value::Array(weak)).into_response()
}

async fn quiz(State(state): State<FakeState>) -> Response {
    if state.fails("/study/quiz") {
        return server_error();
    }
    Json(quiz_json()).into_response()
}

async fn current_progress() -> Json<Value> {
    Json(json!({"level": "초급1", "current_page": 3}))
}

async fn multipart_fields(mut multipart: Multipart) -> (HashMap<String, String>, usize) {
    let mut fields = HashMap::new();
    let mut audio_len = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let Ok(data) = field.bytes().await else {
            break;
        };
        if name == "audio" {
            audio_len = data.len();
        } else {
            fields.insert(name, String::from_utf8_lossy(&data).into_owned());
        }
    }
    (fields, audio_len)
}

async fn complete(State(state): State<FakeState>, multipart: Multipart) -> Response {
    if state.fails("/study/complete") {
        return server_error();
    }
    let (fields, _) = multipart_fields(multipart).await;
    let level = fields.get("level").cloned().unwrap_or_default();
    let user_id = fields.get("user_id").cloned().unwrap_or_default();
    state.lock().completions.push((level, user_id));
    Json(json!({"status": "success", "next_page": 2})).into_response()
}

async fn evaluate(State(state): State<FakeState>, multipart: Multipart) -> Response {
    let (fields, audio_len) = multipart_fields(multipart).await;
    let upload = Upload {
        text: fields.get("text").cloned().unwrap_or_default(),
        word: fields.get("word").cloned().unwrap_or_default(),
        user_id: fields.get("user_id").cloned().unwrap_or_default(),
        audio_len,
    };
    let text = upload.text.clone();
    let reply = {
        let mut recorded = state.lock();
        recorded.uploads.push(upload);
        recorded.evaluation_reply.clone()
    };
    match reply {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
        None => Json(evaluation_json(&text, 85.0)).into_response(),
    }
}

async fn profile(Path(id): Path<String>) -> Response {
    let accounts = accounts();
    let Some(account) = accounts.get(id.as_str()) else {
        return detail(StatusCode::NOT_FOUND, "사용자를 찾을 수 없습니다.");
    };
    Json(json!({
        "uid": id,
        "name": account.name,
        "role": account.role,
        "email": format!("{}@example.com", id),
        "phone": "010-0000-0000",
        "country": "KR",
        "dailyGoal": 10,
        "reviewWrong": true
    }))
    .into_response()
}

async fn ack() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn change_password(Json(body): Json<Value>) -> Response {
    if body["old_password"].as_str() != Some(FIXTURE_PASSWORD) {
        return detail(StatusCode::BAD_REQUEST, "현재 비밀번호가 일치하지 않습니다.");
    }
    Json(json!({"status": "ok"})).into_response()
}

async fn withdraw(State(state): State<FakeState>, Path(id): Path<String>) -> Json<Value> {
    state.lock().withdrawn.push(id);
    Json(json!({"status": "ok"}))
}

async fn user_stats(Path(id): Path<String>) -> Json<Value> {
    let name = accounts().get(id.as_str()).map(|a| a.name).unwrap_or_default();
    Json(json!({
        "name": name,
        "total_learned": 25,
        "chart_data": [{"name": "음식", "score": 80.0}, {"name": "학교", "score": 65.5}],
        "goal": 10
    }))
}

async fn students(State(state): State<FakeState>) -> Response {
    if state.fails("/api/teacher/students") {
        return server_error();
    }
    Json(json!({
        "ok": true,
        "items": [
            {"uid": "student1", "name": "김학생", "country": "KR", "current_level": "초급1",
             "current_page": 3, "avg_score": 82.5, "progress_rate": 0.3},
            {"uid": "student2", "name": "이학생", "country": "VN", "current_level": "미시작",
             "current_page": 1, "avg_score": 0.0, "progress_rate": 0.0}
        ]
    }))
    .into_response()
}

async fn student_detail(Path(uid): Path<String>) -> Response {
    let accounts = accounts();
    match accounts.get(uid.as_str()) {
        Some(account) if account.role == "student" => Json(json!({
            "info": {"uid": uid, "name": account.name, "email": format!("{}@example.com", uid),
                     "phone": "010-0000-0000", "country": "KR"},
            "progress": {"level": "초급1", "current_page": 3}
        }))
        .into_response(),
        _ => detail(StatusCode::NOT_FOUND, "학생을 찾을 수 없습니다."),
    }
}

async fn student_stats() -> Json<Value> {
    Json(json!({
        "ok": true,
        "chart_data": [
            {"date": "2025-03-01", "score": 62.0},
            {"date": "2025-03-02", "score": 74.5}
        ]
    }))
}

async fn reset_password(State(state): State<FakeState>, Path(uid): Path<String>) -> Json<Value> {
    state.lock().password_resets.push(uid);
    Json(json!({"status": "ok"}))
}

async fn send_notice(State(state): State<FakeState>, Json(body): Json<Value>) -> Response {
    let Some(title) = body["title"].as_str() else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "title is required");
    };
    state.lock().notices.push(title.to_string());
    Json(json!({"status": "ok"})).into_response()
}

async fn notice_list() -> Json<Value> {
    Json(json!([
        {"id": 1, "title": "개강 안내", "content": "3월 2일 개강합니다.",
         "created_at": "2025-02-20T09:00:00", "author": "박선생"},
        {"id": 2, "title": "기말 시험 안내", "content": "6월 20일입니다.",
         "created_at": "2025-06-01T09:00:00", "author": "박선생"}
    ]))
}

async fn notice_logs(State(state): State<FakeState>) -> Json<Value> {
    let sent: Vec<Value> = state
        .lock()
        .notices
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({"id": 100 + i, "title": title, "content": "",
                   "created_at": format!("2025-07-01T09:00:{:02}", i)})
        })
        .collect();
    Json(Value::Array(sent))
}

async fn pending_teachers(State(state): State<FakeState>) -> Json<Value> {
    let approved = state.lock().approved.clone();
    let pending: Vec<Value> = accounts()
        .into_iter()
        .filter(|(uid, a)| a.role == "teacher" && !a.approved && !approved.iter().any(|x| x.as_str() == *uid))
        .map(|(uid, a)| json!({"uid": uid, "name": a.name, "email": format!("{}@example.com", uid)}))
        .collect();
    Json(Value::Array(pending))
}

async fn approve(State(state): State<FakeState>, Path(uid): Path<String>) -> Json<Value> {
    state.lock().approved.push(uid);
    Json(json!({"status": "ok"}))
}

async fn echo_cookie(headers: HeaderMap) -> Json<Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Json(json!({ "cookie": cookie }))
}
