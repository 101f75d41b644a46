// src/auth/mod.rs

pub mod session;
pub mod token_store;

pub use session::{AuthContext, AuthSession};
pub use token_store::{TokenScope, TokenStore};
