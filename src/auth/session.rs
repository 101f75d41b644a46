// src/auth/session.rs

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    auth::token_store::{TokenScope, TokenStore},
    error::AppError,
    utils::jwt::{Claims, decode_claims},
};

/// The signed-in user, as decoded from the current token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub claims: Claims,
    pub scope: TokenScope,
}

/// Owns the token store and the decoded session.
///
/// Constructed once at start-up and shared (behind an `Arc`) with the
/// HTTP client and the front-end. `init` restores a stored session,
/// `logout` tears it down.
pub struct AuthContext {
    store: TokenStore,
    session: RwLock<Option<AuthSession>>,
}

impl AuthContext {
    pub fn new(store: TokenStore) -> Self {
        Self {
            store,
            session: RwLock::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<AuthSession>> {
        self.session.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<AuthSession>> {
        self.session.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Restores the session from a stored token.
    ///
    /// An undecodable or expired token is discarded together with the other
    /// scope, leaving the user signed out.
    pub fn init(&self) -> Result<Option<AuthSession>, AppError> {
        let Some((token, scope)) = self.store.current()? else {
            return Ok(None);
        };

        match decode_claims(&token) {
            Ok(claims) if !claims.is_expired() => {
                tracing::info!("Restored session for {}", claims.username);
                let session = AuthSession { claims, scope };
                *self.write() = Some(session.clone());
                Ok(Some(session))
            }
            Ok(_) => {
                tracing::info!("Stored token expired, signing out");
                self.invalidate();
                Ok(None)
            }
            Err(_) => {
                tracing::warn!("Stored token is invalid, signing out");
                self.invalidate();
                Ok(None)
            }
        }
    }

    /// Signs in with a freshly issued token.
    ///
    /// `remember` selects the durable scope; the other scope is cleared.
    pub fn login(&self, token: &str, remember: bool) -> Result<AuthSession, AppError> {
        let claims = match decode_claims(token) {
            Ok(claims) => claims,
            Err(e) => {
                self.invalidate();
                return Err(e);
            }
        };

        let scope = if remember {
            TokenScope::Durable
        } else {
            TokenScope::Ephemeral
        };
        self.store.store(token, scope)?;

        tracing::info!("Signed in as {}", claims.username);
        let session = AuthSession { claims, scope };
        *self.write() = Some(session.clone());
        Ok(session)
    }

    /// Swaps in a refreshed token, keeping its scope.
    pub fn replace_token(&self, token: &str) -> Result<AuthSession, AppError> {
        let claims = decode_claims(token)?;
        let scope = self.store.replace(token)?;
        let session = AuthSession { claims, scope };
        *self.write() = Some(session.clone());
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.store.clear()?;
        *self.write() = None;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Drops the session after an unrecoverable auth failure.
    /// Storage errors are logged, the in-memory session is always cleared.
    pub fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear stored tokens: {}", e);
        }
        *self.write() = None;
    }

    /// Token to attach to outbound requests.
    pub fn token(&self) -> Option<String> {
        match self.store.token() {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }
}
