// src/lib.rs

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod state;
pub mod utils;

// Re-export specific items for convenience if needed
pub use api::ApiClient;
pub use quiz::evaluate;
