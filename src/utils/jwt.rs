// src/utils/jwt.rs

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims structure as issued by the quiz backend.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID.
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// User roles (e.g., 'user', 'admin').
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration time as Unix timestamp.
    pub exp: i64,
}

impl Claims {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

/// Decodes the claims of a JWT string without checking its signature.
///
/// The client never holds the signing secret; the backend re-verifies every
/// token it receives. Expiry is checked by the caller.
pub fn decode_claims(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}
