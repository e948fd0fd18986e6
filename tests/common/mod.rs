//! Shared setup for the HTTP tests: a portal wired to the fake backend.

#![allow(dead_code)]

use axum_test::TestServer;
use kr_study_portal::app;
use kr_study_portal::config::AppConfig;
use kr_study_portal::state::AppState;
use kr_study_portal::testing::{FakeBackend, FIXTURE_PASSWORD};

pub struct Portal {
    pub server: TestServer,
    pub backend: FakeBackend,
}

/// Start a portal with default configuration
pub async fn portal() -> Portal {
    portal_with(|_| {}).await
}

/// Start a portal after adjusting its configuration
pub async fn portal_with(configure: impl FnOnce(&mut AppConfig)) -> Portal {
    let backend = FakeBackend::start().await.expect("fake backend");
    let mut config = backend.app_config();
    configure(&mut config);
    let state = AppState::new(backend.client(), config);
    let server = TestServer::builder()
        .save_cookies()
        .build(app(state))
        .expect("test server");
    Portal { server, backend }
}

/// Portal whose timed screens resolve on the next request
pub async fn instant_portal() -> Portal {
    portal_with(|config| {
        config.study.encouragement_delay_ms = 0;
        config.study.review_intro_delay_ms = 0;
    })
    .await
}

impl Portal {
    pub async fn login(&self, id: &str) {
        let response = self
            .server
            .post("/login")
            .form(&[("id", id), ("password", FIXTURE_PASSWORD)])
            .await;
        assert_eq!(response.status_code(), 303, "login as {} failed", id);
    }

    /// POST a bodiless action and return the redirect target
    pub async fn post_location(&self, path: &str) -> String {
        let response = self.server.post(path).await;
        location(&response)
    }

    pub async fn page(&self, path: &str) -> String {
        let response = self.server.get(path).await;
        assert_eq!(response.status_code(), 200, "GET {}", path);
        response.text()
    }
}

pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default()
}
