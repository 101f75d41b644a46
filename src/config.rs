// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

/// Name of the file holding the durable ("remember me") token inside `token_dir`.
pub const TOKEN_FILE_NAME: &str = "token";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the quiz backend, e.g. `http://localhost:8080/`.
    pub api_base_url: Url,
    /// Directory for the durable token scope.
    pub token_dir: PathBuf,
    pub rust_log: String,
    pub log_dir: PathBuf,
    /// Whole-quiz countdown in seconds. `None` disables the countdown.
    pub quiz_time_limit: Option<u64>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let api_base_url = env::var("API_BASE_URL")
            .map_err(|_| AppError::ValidationError("API_BASE_URL must be set".to_string()))?;
        let api_base_url = Url::parse(&api_base_url)?;

        let token_dir = env::var("TOKEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".quiz-client"));

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let quiz_time_limit = match env::var("QUIZ_TIME_LIMIT_SECS") {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|_| {
                AppError::ValidationError(format!("QUIZ_TIME_LIMIT_SECS is not a number: {}", raw))
            })?),
            Err(_) => None,
        };

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(15);

        Ok(Self {
            api_base_url,
            token_dir,
            rust_log,
            log_dir,
            quiz_time_limit,
            request_timeout: Duration::from_secs(request_timeout),
        })
    }

    /// Path of the durable token file.
    pub fn token_path(&self) -> PathBuf {
        self.token_dir.join(TOKEN_FILE_NAME)
    }
}
