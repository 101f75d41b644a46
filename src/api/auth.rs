// src/api/auth.rs

use reqwest::Method;
use validator::Validate;

use crate::{
    api::client::ApiClient,
    auth::AuthSession,
    error::AppError,
    models::user::{
        ConfirmEmailRequest, LoginRequest, MessageResponse, RegisterRequest,
        ResendConfirmationRequest, TokenResponse,
    },
};

/// Account endpoints. None of them go through the refresh policy.
impl ApiClient {
    /// Authenticates and signs the user in.
    ///
    /// Validates the form locally first, then stores the issued token in the
    /// scope selected by `remember`.
    pub async fn login(&self, req: &LoginRequest, remember: bool) -> Result<AuthSession, AppError> {
        req.validate()?;

        let resp: TokenResponse = self
            .send_public(Method::POST, "api/auth/login", Some(req))
            .await
            .map_err(|e| {
                tracing::warn!("Login failed for {}: {}", req.username, e);
                e
            })?;

        self.auth().login(&resp.token, remember)
    }

    /// Creates an account. The backend then emails a confirmation link.
    pub async fn register(&self, req: &RegisterRequest) -> Result<(), AppError> {
        req.validate()?;
        let _: Option<serde_json::Value> = self
            .send_public(Method::POST, "api/auth/register", Some(req))
            .await?;
        tracing::info!("Registered {}", req.username);
        Ok(())
    }

    pub async fn resend_confirmation(&self, req: &ResendConfirmationRequest) -> Result<String, AppError> {
        req.validate()?;
        let resp: Option<MessageResponse> = self
            .send_public(Method::POST, "api/auth/resend-confirmation", Some(req))
            .await?;
        Ok(resp.unwrap_or_default().message)
    }

    pub async fn confirm_email(&self, req: &ConfirmEmailRequest) -> Result<(), AppError> {
        req.validate()?;
        let _: Option<serde_json::Value> = self
            .send_public(Method::POST, "api/confirm", Some(req))
            .await?;
        tracing::info!("Email confirmed");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.auth().logout()
    }
}
