// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for user login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// DTO for creating a new account (Registration).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResendConfirmationRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmEmailRequest {
    #[validate(length(min = 1, message = "Invalid or expired token."))]
    pub token: String,
}

/// Token issued by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_rules() {
        let ok = RegisterRequest {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "secret1".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            username: "yo".into(),
            email: "not-an-email".into(),
            password: "123".into(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn login_requires_both_fields() {
        let req = LoginRequest {
            username: String::new(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());
    }
}
