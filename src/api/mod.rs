// src/api/mod.rs

pub mod auth;
pub mod client;
pub mod quiz;

pub use client::ApiClient;
