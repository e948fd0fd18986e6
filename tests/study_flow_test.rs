mod common;

use axum_test::multipart::{MultipartForm, Part};
use common::{instant_portal, location, portal, Portal};
use kr_study_portal::testing::{evaluation_json, EMPTY_LEVEL};
use serde_json::json;

const STUDY: &str = "/study/vocabulary";

async fn start_studying(portal: &Portal) -> String {
    portal.login("student1").await;
    portal.page(STUDY).await
}

async fn next(portal: &Portal) {
    assert_eq!(portal.post_location("/study/vocabulary/next").await, STUDY);
}

async fn record(portal: &Portal, bytes: usize) {
    let response = portal
        .server
        .post("/study/vocabulary/record/start")
        .form(&[("mic", "granted")])
        .await;
    assert_eq!(location(&response), STUDY);

    let clip = Part::bytes(vec![7u8; bytes])
        .file_name("recording.webm")
        .mime_type("audio/webm");
    let response = portal
        .server
        .post("/study/vocabulary/record/stop")
        .multipart(MultipartForm::new().add_part("audio", clip))
        .await;
    assert_eq!(location(&response), STUDY);
}

#[tokio::test]
async fn first_visit_starts_the_default_level() {
    let portal = portal().await;
    let body = start_studying(&portal).await;
    assert!(body.contains("1 / 10"));
    assert!(body.contains("사과"));
    assert!(body.contains("/assets/audio/voca/"));
}

#[tokio::test]
async fn level_query_is_dropped_after_start() {
    let portal = portal().await;
    portal.login("student1").await;
    let response = portal
        .server
        .get(STUDY)
        .add_query_param("level", "초급2")
        .await;
    assert_eq!(location(&response), STUDY);
    assert!(portal.page(STUDY).await.contains("1 / 10"));
}

#[tokio::test]
async fn unknown_level_goes_back_to_level_select() {
    let portal = portal().await;
    portal.login("student1").await;
    let response = portal.server.get(STUDY).add_query_param("level", "상급9").await;
    assert_eq!(location(&response), "/level_select");
    assert!(portal.page("/level_select").await.contains("Unknown level: 상급9"));
}

#[tokio::test]
async fn empty_level_cannot_be_studied() {
    let portal = portal().await;
    portal.login("student1").await;
    let response = portal.server.get(STUDY).add_query_param("level", EMPTY_LEVEL).await;
    assert_eq!(location(&response), "/level_select");
    assert!(portal
        .page("/level_select")
        .await
        .contains("There are no words to study for this level yet."));
}

#[tokio::test]
async fn word_fetch_failure_is_reported() {
    let portal = portal().await;
    portal.backend.fail("/study/words");
    portal.login("student1").await;
    let response = portal.server.get(STUDY).await;
    assert_eq!(location(&response), "/level_select");
    assert!(portal
        .page("/level_select")
        .await
        .contains("Could not reach the server. Please try again."));
}

#[tokio::test]
async fn actions_without_a_session_go_to_level_select() {
    let portal = portal().await;
    portal.login("student1").await;
    assert_eq!(portal.post_location("/study/vocabulary/flip").await, "/level_select");
}

#[tokio::test]
async fn teachers_cannot_study() {
    let portal = portal().await;
    portal.login("teacher1").await;
    let response = portal.server.get(STUDY).await;
    assert_eq!(location(&response), "/teacher_dash");
}

#[tokio::test]
async fn previous_and_next_move_between_cards() {
    let portal = portal().await;
    start_studying(&portal).await;

    next(&portal).await;
    next(&portal).await;
    assert!(portal.page(STUDY).await.contains("3 / 10"));

    portal.post_location("/study/vocabulary/prev").await;
    assert!(portal.page(STUDY).await.contains("2 / 10"));

    // Restarting the same level begins again
    let response = portal
        .server
        .get(STUDY)
        .add_query_param("level", "초급1")
        .add_query_param("restart", "1")
        .await;
    assert_eq!(location(&response), STUDY);
    assert!(portal.page(STUDY).await.contains("1 / 10"));
}

#[tokio::test]
async fn encouragement_shows_once_after_the_fifth_word() {
    let portal = portal().await;
    start_studying(&portal).await;
    for _ in 0..5 {
        next(&portal).await;
    }

    let body = portal.page(STUDY).await;
    assert!(body.contains("잘하고 있어요!"));
    assert!(body.contains(r#"http-equiv="refresh""#));

    // Input is refused while it is up
    portal.post_location("/study/vocabulary/next").await;
    assert!(portal.page(STUDY).await.contains("잘하고 있어요!"));
}

#[tokio::test]
async fn flipped_card_needs_a_score_before_next() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.post_location("/study/vocabulary/flip").await;

    next(&portal).await;
    let body = portal.page(STUDY).await;
    assert!(body.contains("Finish this card before moving on."));
    assert!(body.contains("1 / 10"));
}

#[tokio::test]
async fn recording_is_scored_by_the_backend() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.post_location("/study/vocabulary/flip").await;
    record(&portal, 4096).await;

    assert_eq!(portal.post_location("/study/vocabulary/evaluate").await, STUDY);

    let uploads = portal.backend.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].word, "사과");
    assert_eq!(uploads[0].text, "사과를 먹어요.");
    assert_eq!(uploads[0].user_id, "student1");
    assert_eq!(uploads[0].audio_len, 4096);

    let body = portal.page(STUDY).await;
    assert!(body.contains("grade-good"));
    assert!(body.contains(r#"<p class="score">85</p>"#));
    // Per-word band and per-phone breakdown
    assert!(body.contains(r#"<li class="grade-good">"#));
    assert!(body.contains(r#"<span class="phone-symbol">s</span><span class="phone-score">85</span>"#));

    // The score unlocks next
    next(&portal).await;
    assert!(portal.page(STUDY).await.contains("2 / 10"));
}

#[tokio::test]
async fn short_recording_is_rejected() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.post_location("/study/vocabulary/flip").await;
    record(&portal, 100).await;

    let body = portal.page(STUDY).await;
    assert!(body.contains("The recording was too short. Please record again."));
    assert!(portal.backend.uploads().is_empty());
}

#[tokio::test]
async fn denied_microphone_is_explained() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.post_location("/study/vocabulary/flip").await;
    let response = portal
        .server
        .post("/study/vocabulary/record/start")
        .form(&[("mic", "denied")])
        .await;
    assert_eq!(location(&response), STUDY);
    assert!(portal.page(STUDY).await.contains("Microphone access was denied."));
}

#[tokio::test]
async fn recording_needs_the_practice_face() {
    let portal = portal().await;
    start_studying(&portal).await;
    let response = portal
        .server
        .post("/study/vocabulary/record/start")
        .form(&[("mic", "granted")])
        .await;
    assert_eq!(location(&response), STUDY);
    assert!(portal.page(STUDY).await.contains("Flip the card to the practice side first"));
}

#[tokio::test]
async fn failed_evaluation_keeps_the_recording() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.backend.set_evaluation_reply(500, json!({"detail": "engine down"}));
    portal.post_location("/study/vocabulary/flip").await;
    record(&portal, 4096).await;
    portal.post_location("/study/vocabulary/evaluate").await;

    let body = portal.page(STUDY).await;
    assert!(body.contains("Could not reach the server. Please try again."));
    // Can try scoring the same clip again
    assert!(body.contains("/study/vocabulary/evaluate"));
}

#[tokio::test]
async fn quiz_cannot_start_during_learning() {
    let portal = portal().await;
    start_studying(&portal).await;
    portal.post_location("/study/vocabulary/quiz/start").await;
    assert!(portal.page(STUDY).await.contains("Cannot start the quiz"));
}

#[tokio::test]
async fn full_session_ends_with_completion() {
    let portal = instant_portal().await;
    start_studying(&portal).await;

    for _ in 0..5 {
        next(&portal).await;
    }
    // Encouragement resolves on the next page load
    assert!(portal.page(STUDY).await.contains("6 / 10"));
    for _ in 5..10 {
        next(&portal).await;
    }

    let body = portal.page(STUDY).await;
    assert!(body.contains("/study/vocabulary/quiz/start"));
    assert_eq!(portal.post_location("/study/vocabulary/quiz/start").await, STUDY);
    assert!(portal.page(STUDY).await.contains("은 한국어로?"));

    // Wrong answer keeps the learner on the question
    portal
        .server
        .post("/study/vocabulary/quiz/answer")
        .form(&[("option", "포도")])
        .await;
    next(&portal).await;
    let body = portal.page(STUDY).await;
    assert!(body.contains("Not quite."));
    assert!(portal.backend.completions().is_empty());

    portal
        .server
        .post("/study/vocabulary/quiz/answer")
        .form(&[("option", "사과")])
        .await;
    next(&portal).await;

    let body = portal.page(STUDY).await;
    assert!(body.contains("학습 완료!"));
    assert!(body.contains("Quiz questions: 1"));
    assert_eq!(
        portal.backend.completions(),
        vec![("초급1".to_string(), "student1".to_string())]
    );
}

#[tokio::test]
async fn weak_words_are_reviewed_before_the_quiz() {
    let portal = instant_portal().await;
    portal.backend.set_evaluation_reply(200, evaluation_json("사과를 먹어요.", 40.0));
    start_studying(&portal).await;

    portal.post_location("/study/vocabulary/flip").await;
    record(&portal, 4096).await;
    portal.post_location("/study/vocabulary/evaluate").await;
    assert!(portal.page(STUDY).await.contains("grade-poor"));

    for _ in 0..5 {
        next(&portal).await;
    }
    portal.page(STUDY).await;
    for _ in 5..10 {
        next(&portal).await;
    }

    let body = portal.page(STUDY).await;
    assert!(body.contains("phase-review"));
    assert!(body.contains("1 / 1"));
    assert!(body.contains("사과"));

    next(&portal).await;
    assert!(portal.page(STUDY).await.contains("/study/vocabulary/quiz/start"));
}

#[tokio::test]
async fn review_entry_practises_missed_words() {
    let portal = instant_portal().await;
    portal.login("student1").await;

    let response = portal.server.get("/study/review").await;
    assert_eq!(location(&response), STUDY);

    let body = portal.page(STUDY).await;
    assert!(body.contains("phase-review"));
    assert!(body.contains("1 / 2"));
}

#[tokio::test]
async fn review_failure_returns_home() {
    let portal = portal().await;
    portal.backend.fail("/study/review-words");
    portal.login("student1").await;

    let response = portal.server.get("/study/review").await;
    assert_eq!(location(&response), "/student_home");
}
