// src/error.rs

use std::fmt;

use reqwest::StatusCode;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to user-visible messages.
#[derive(Debug)]
pub enum AppError {
    // Transport failure or 5xx from the backend. Recoverable.
    NetworkError(String),

    // 401/403, invalid or expired token, failed refresh.
    AuthError(String),

    // Malformed input, 400/422 from the backend, bad answer or navigation.
    ValidationError(String),

    // 404 Not Found
    NotFound(String),

    // Operation invoked in the wrong session phase. Always a bug.
    StateViolation(String),

    // Response body did not match the expected shape.
    DecodeError(String),

    // Token persistence failure.
    StorageError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NetworkError(msg) => write!(f, "network error: {}", msg),
            AppError::AuthError(msg) => write!(f, "authentication error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::StateViolation(msg) => write!(f, "state violation: {}", msg),
            AppError::DecodeError(msg) => write!(f, "decode error: {}", msg),
            AppError::StorageError(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Converts the error into the message shown to the user.
    /// Internal details are logged instead of being surfaced.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NetworkError(msg) => {
                tracing::warn!("Network failure: {}", msg);
                "Could not reach the quiz server. Please try again.".to_string()
            }
            AppError::AuthError(msg) => msg.clone(),
            AppError::ValidationError(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::StateViolation(msg) => {
                tracing::error!("State violation: {}", msg);
                "Something went wrong".to_string()
            }
            AppError::DecodeError(msg) | AppError::StorageError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Something went wrong".to_string()
            }
        }
    }

    /// Whether the user may simply try the same action again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::ValidationError(_) | AppError::NotFound(_)
        )
    }

    /// Maps a non-success HTTP status and the backend's `{"error": ...}` message.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::AuthError(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
                AppError::ValidationError(message)
            }
            _ => AppError::NetworkError(format!("HTTP {}: {}", status.as_u16(), message)),
        }
    }
}

/// Converts `reqwest::Error` into `AppError`.
/// Allows using `?` operator on outbound requests.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::DecodeError(err.to_string())
        } else {
            AppError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DecodeError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::AuthError("Invalid token".to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ValidationError(format!("invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(matches!(
            AppError::from_status(StatusCode::UNAUTHORIZED, "x".into()),
            AppError::AuthError(_)
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::NOT_FOUND, "x".into()),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from_status(StatusCode::BAD_GATEWAY, "x".into()),
            AppError::NetworkError(_)
        ));
    }

    #[test]
    fn auth_failures_are_not_recoverable() {
        assert!(!AppError::AuthError("expired".into()).is_recoverable());
        assert!(AppError::NetworkError("timeout".into()).is_recoverable());
    }

    #[test]
    fn internal_details_stay_out_of_user_messages() {
        let err = AppError::StorageError("/home/u/.quiz-client/token: EACCES".into());
        assert_eq!(err.user_message(), "Something went wrong");
    }
}
