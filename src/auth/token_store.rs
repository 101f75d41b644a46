// src/auth/token_store.rs

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{config::Config, error::AppError};

/// Where a token lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Survives restarts ("remember me").
    Durable,
    /// Lives only as long as the process.
    Ephemeral,
}

/// One persistence location for a token.
pub trait TokenSlot: Send + Sync {
    fn load(&self) -> Result<Option<String>, AppError>;
    fn save(&self, token: &str) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

/// Token kept in a file.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSlot for FileSlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token kept in process memory.
#[derive(Default)]
pub struct MemorySlot {
    token: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Option<String>) -> R) -> R {
        let mut guard = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl TokenSlot for MemorySlot {
    fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.with(|t| t.clone()))
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        self.with(|t| *t = Some(token.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        self.with(|t| *t = None);
        Ok(())
    }
}

/// The two token scopes. At most one of them holds a token after any
/// operation of this type; if both somehow do, the durable one wins.
pub struct TokenStore {
    durable: Box<dyn TokenSlot>,
    ephemeral: Box<dyn TokenSlot>,
}

impl TokenStore {
    pub fn new(durable: Box<dyn TokenSlot>, ephemeral: Box<dyn TokenSlot>) -> Self {
        Self { durable, ephemeral }
    }

    /// File-backed durable scope under `TOKEN_DIR`, memory-backed ephemeral scope.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(FileSlot::new(config.token_path())),
            Box::new(MemorySlot::new()),
        )
    }

    /// Both scopes in memory. Used by tests and short-lived tools.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::new()), Box::new(MemorySlot::new()))
    }

    fn slot(&self, scope: TokenScope) -> &dyn TokenSlot {
        match scope {
            TokenScope::Durable => self.durable.as_ref(),
            TokenScope::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    /// Stores `token` in `scope` and clears the other scope, so no stale
    /// token is left behind from an earlier login.
    pub fn store(&self, token: &str, scope: TokenScope) -> Result<(), AppError> {
        let other = match scope {
            TokenScope::Durable => TokenScope::Ephemeral,
            TokenScope::Ephemeral => TokenScope::Durable,
        };
        self.slot(other).clear()?;
        self.slot(scope).save(token)?;
        tracing::debug!(?scope, "Token stored");
        Ok(())
    }

    /// Current token and the scope holding it. Durable takes precedence.
    pub fn current(&self) -> Result<Option<(String, TokenScope)>, AppError> {
        if let Some(token) = self.durable.load()? {
            return Ok(Some((token, TokenScope::Durable)));
        }
        Ok(self
            .ephemeral
            .load()?
            .map(|token| (token, TokenScope::Ephemeral)))
    }

    pub fn token(&self) -> Result<Option<String>, AppError> {
        Ok(self.current()?.map(|(token, _)| token))
    }

    /// Replaces the current token, keeping it in the scope the old one lived in.
    /// Falls back to the ephemeral scope when nothing was stored.
    pub fn replace(&self, token: &str) -> Result<TokenScope, AppError> {
        let scope = self
            .current()?
            .map(|(_, scope)| scope)
            .unwrap_or(TokenScope::Ephemeral);
        self.store(token, scope)?;
        Ok(scope)
    }

    /// Clears both scopes.
    pub fn clear(&self) -> Result<(), AppError> {
        self.durable.clear()?;
        self.ephemeral.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_scope_replaces_the_other_scope() {
        let store = TokenStore::in_memory();
        store.store("durable-token", TokenScope::Durable).unwrap();
        store.store("session-token", TokenScope::Ephemeral).unwrap();

        assert_eq!(
            store.current().unwrap(),
            Some(("session-token".to_string(), TokenScope::Ephemeral))
        );
        assert!(store.durable.load().unwrap().is_none());
    }

    #[test]
    fn durable_wins_when_both_are_present() {
        let store = TokenStore::in_memory();
        store.ephemeral.save("e").unwrap();
        store.durable.save("d").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("d"));
    }

    #[test]
    fn replace_keeps_scope() {
        let store = TokenStore::in_memory();
        store.store("old", TokenScope::Durable).unwrap();
        assert_eq!(store.replace("new").unwrap(), TokenScope::Durable);
        assert_eq!(
            store.current().unwrap(),
            Some(("new".to_string(), TokenScope::Durable))
        );
    }

    #[test]
    fn clear_empties_both() {
        let store = TokenStore::in_memory();
        store.store("t", TokenScope::Durable).unwrap();
        store.ephemeral.save("e").unwrap();
        store.clear().unwrap();
        assert!(store.current().unwrap().is_none());
    }

    #[test]
    fn file_slot_round_trips_and_tolerates_missing_file() {
        let dir = std::env::temp_dir().join(format!("quiz-client-test-{}", std::process::id()));
        let slot = FileSlot::new(dir.join("nested").join("token"));

        assert!(slot.load().unwrap().is_none());
        slot.save("abc.def.ghi").unwrap();
        assert_eq!(slot.load().unwrap().as_deref(), Some("abc.def.ghi"));
        slot.clear().unwrap();
        slot.clear().unwrap();
        assert!(slot.load().unwrap().is_none());

        let _ = fs::remove_dir_all(dir);
    }
}
