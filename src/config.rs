//! Application configuration.
//!
//! Every value resolves with priority: config.toml > environment (.env) > default.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

// ==================== Defaults ====================

/// Server address to bind to
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Backend API base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Login session lifetime in hours of inactivity
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Items scoring below this are queued for review
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 70.0;

/// Pressing next on this (0-based) learning index shows the encouragement screen
pub const DEFAULT_ENCOURAGEMENT_INDEX: usize = 4;

pub const DEFAULT_ENCOURAGEMENT_DELAY_MS: u64 = 1500;

pub const DEFAULT_REVIEW_INTRO_DELAY_MS: u64 = 3000;

/// Recordings smaller than this are treated as truncated and never scored
pub const DEFAULT_MIN_RECORDING_BYTES: usize = 2048;

/// Level used when the study page is opened without one
pub const DEFAULT_LEVEL: &str = "초급1";

// ==================== Resolved configuration ====================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub session: SessionConfig,
    pub study: StudyConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

impl ServerConfig {
    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// No timeout unless configured
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub expiry_hours: i64,
    pub secure_cookie: bool,
}

/// Tunables of the vocabulary study flow.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyConfig {
    pub review_threshold: f64,
    pub encouragement_index: usize,
    pub encouragement_delay_ms: u64,
    pub review_intro_delay_ms: u64,
    pub min_recording_bytes: usize,
    pub default_level: String,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            review_threshold: DEFAULT_REVIEW_THRESHOLD,
            encouragement_index: DEFAULT_ENCOURAGEMENT_INDEX,
            encouragement_delay_ms: DEFAULT_ENCOURAGEMENT_DELAY_MS,
            review_intro_delay_ms: DEFAULT_REVIEW_INTRO_DELAY_MS,
            min_recording_bytes: DEFAULT_MIN_RECORDING_BYTES,
            default_level: DEFAULT_LEVEL.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        resolve(FileConfig::default(), |_| None)
    }
}

// ==================== config.toml structure ====================

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<FileServer>,
    backend: Option<FileBackend>,
    session: Option<FileSession>,
    study: Option<FileStudy>,
}

#[derive(Debug, Default, Deserialize)]
struct FileServer {
    addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct FileBackend {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSession {
    expiry_hours: Option<i64>,
    secure_cookie: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileStudy {
    review_threshold: Option<f64>,
    encouragement_index: Option<usize>,
    encouragement_delay_ms: Option<u64>,
    review_intro_delay_ms: Option<u64>,
    min_recording_bytes: Option<usize>,
    default_level: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ==================== Loading ====================

/// Load configuration: `PORTAL_CONFIG` (or ./config.toml) > env > defaults.
///
/// A missing config file is not an error; an unreadable or invalid one is.
pub fn load() -> Result<AppConfig, ConfigError> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let path = std::env::var("PORTAL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_from(Path::new(&path), |key| std::env::var(key).ok())
}

/// Load from an explicit file path with an injectable environment lookup.
pub fn load_from<F>(path: &Path, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: FileConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!("Using config file {}", path.display());
        parsed
    } else {
        FileConfig::default()
    };

    Ok(resolve(file, env))
}

fn parse_env<T: FromStr, F: Fn(&str) -> Option<String>>(env: &F, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={}", key, raw);
            None
        }
    }
}

fn resolve<F>(file: FileConfig, env: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let server = file.server.unwrap_or_default();
    let backend = file.backend.unwrap_or_default();
    let session = file.session.unwrap_or_default();
    let study = file.study.unwrap_or_default();
    let defaults = StudyConfig::default();

    let base_url = backend
        .base_url
        .or_else(|| env("PORTAL_BACKEND_URL"))
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    AppConfig {
        server: ServerConfig {
            addr: server
                .addr
                .or_else(|| env("PORTAL_BIND_ADDR"))
                .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            port: server
                .port
                .or_else(|| parse_env(&env, "PORTAL_PORT"))
                .unwrap_or(DEFAULT_SERVER_PORT),
        },
        backend: BackendConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: backend
                .timeout_secs
                .or_else(|| parse_env(&env, "PORTAL_BACKEND_TIMEOUT_SECS")),
        },
        session: SessionConfig {
            expiry_hours: session.expiry_hours.unwrap_or(DEFAULT_SESSION_EXPIRY_HOURS),
            secure_cookie: session.secure_cookie.unwrap_or(false),
        },
        study: StudyConfig {
            review_threshold: study
                .review_threshold
                .or_else(|| parse_env(&env, "PORTAL_REVIEW_THRESHOLD"))
                .unwrap_or(defaults.review_threshold),
            encouragement_index: study
                .encouragement_index
                .unwrap_or(defaults.encouragement_index),
            encouragement_delay_ms: study
                .encouragement_delay_ms
                .unwrap_or(defaults.encouragement_delay_ms),
            review_intro_delay_ms: study
                .review_intro_delay_ms
                .unwrap_or(defaults.review_intro_delay_ms),
            min_recording_bytes: study
                .min_recording_bytes
                .or_else(|| parse_env(&env, "PORTAL_MIN_RECORDING_BYTES"))
                .unwrap_or(defaults.min_recording_bytes),
            default_level: study.default_level.unwrap_or(defaults.default_level),
        },
    }
}
