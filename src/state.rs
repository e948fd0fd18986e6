//! Application state shared by all handlers.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::session::SessionStore;
use crate::study::StudyRules;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Client for the backend REST API
    pub api: ApiClient,

    /// Signed-in browsers and their study sessions
    pub sessions: SessionStore,

    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(api: ApiClient, config: AppConfig) -> Self {
        Self {
            api,
            sessions: SessionStore::new(config.session.expiry_hours),
            config: Arc::new(config),
        }
    }

    pub fn study_rules(&self) -> StudyRules {
        StudyRules::from(&self.config.study)
    }
}
