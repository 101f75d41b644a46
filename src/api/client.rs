// src/api/client.rs

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use url::Url;

use crate::{
    auth::AuthContext, config::Config, error::AppError, models::user::TokenResponse,
};

const REFRESH_PATH: &str = "api/auth/refresh";

/// HTTP client for the quiz backend.
///
/// Attaches the current bearer token to every authorized call. A 401 on a
/// call that carried a token triggers exactly one refresh-and-retry;
/// concurrent 401s wait on the same refresh instead of issuing their own.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<AuthContext>,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: &Config, auth: Arc<AuthContext>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http(http, config.api_base_url.clone(), auth))
    }

    pub fn with_http(http: reqwest::Client, base_url: Url, auth: Arc<AuthContext>) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            auth,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn build<B>(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&B>,
        token: Option<&str>,
    ) -> RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }

    /// Sends a request without a token and without the refresh policy.
    /// Used by the account endpoints.
    pub async fn send_public<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let resp = self.build(&method, &url, body, None).send().await?;
        decode_response(resp).await
    }

    /// Sends an authorized request, refreshing the token once on 401.
    pub async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let token = self.auth.token();

        let resp = self
            .build(&method, &url, body, token.as_deref())
            .send()
            .await?;

        if resp.status() != StatusCode::UNAUTHORIZED {
            return decode_response(resp).await;
        }

        // Anonymous calls have nothing to refresh.
        let Some(stale) = token else {
            return decode_response(resp).await;
        };

        tracing::debug!("{} {} returned 401, refreshing token", method, url.path());
        let fresh = self.refresh_after(&stale).await?;

        let retry = self.build(&method, &url, body, Some(&fresh)).send().await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("{} {} still unauthorized after refresh", method, url.path());
            self.auth.invalidate();
            return Err(AppError::AuthError(
                "Authorization failed after token refresh".to_string(),
            ));
        }
        decode_response(retry).await
    }

    /// Returns a token newer than `stale`, refreshing at most once for all
    /// callers that observed the same stale token.
    async fn refresh_after(&self, stale: &str) -> Result<String, AppError> {
        let _gate = self.refresh_gate.lock().await;

        match self.auth.token() {
            None => {
                return Err(AppError::AuthError("Session expired. Please log in again.".to_string()));
            }
            Some(current) if current != stale => {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Ok(current);
            }
            Some(_) => {}
        }

        match self.request_refresh(stale).await {
            Ok(fresh) => {
                if let Err(e) = self.auth.replace_token(&fresh) {
                    self.auth.invalidate();
                    return Err(e);
                }
                tracing::info!("Token refreshed");
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.auth.invalidate();
                Err(AppError::AuthError("Session expired. Please log in again.".to_string()))
            }
        }
    }

    async fn request_refresh(&self, stale: &str) -> Result<String, AppError> {
        let url = self.url(REFRESH_PATH)?;
        let resp = self
            .build::<()>(&Method::POST, &url, None, Some(stale))
            .send()
            .await?;
        let body: TokenResponse = decode_response(resp).await?;
        Ok(body.token)
    }
}

/// `Url::join` drops the last path segment unless the base ends with '/'.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Decodes a success body, or turns the backend's `{"error": ...}` body into
/// an `AppError` matching the status code.
pub(crate) async fn decode_response<T: DeserializeOwned>(resp: Response) -> Result<T, AppError> {
    let status = resp.status();
    if status.is_success() {
        let bytes = resp.bytes().await?;
        // Empty bodies (e.g. 201/204 acknowledgements) decode as `null`.
        let body = if bytes.is_empty() { &b"null"[..] } else { &bytes[..] };
        return Ok(serde_json::from_slice(body)?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    Err(AppError::from_status(status, message))
}
