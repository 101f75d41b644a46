// src/state.rs

use std::sync::Arc;

use crate::{
    api::ApiClient,
    auth::{AuthContext, TokenStore},
    config::Config,
    error::AppError,
    quiz::{QuizFlow, SessionOptions},
};

/// Everything the front-end needs, wired together once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: Arc<AuthContext>,
    pub api: ApiClient,
}

impl AppState {
    /// Builds the state and restores a stored session if one is still valid.
    pub fn init(config: Config) -> Result<Self, AppError> {
        let auth = Arc::new(AuthContext::new(TokenStore::from_config(&config)));
        auth.init()?;
        let api = ApiClient::new(&config, auth.clone())?;
        Ok(Self { config, auth, api })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            track_time: true,
            time_limit: self.config.quiz_time_limit,
        }
    }

    /// A fresh quiz run backed by the HTTP client.
    pub fn quiz_flow(&self) -> QuizFlow<ApiClient> {
        QuizFlow::new(Arc::new(self.api.clone()), self.session_options())
    }
}
