//! Shared errors and configuration for Vanish.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy with HTTP status mapping
//! - Layered configuration loading

pub mod config;
pub mod error;

pub use config::{
    AppConfig, DatabaseConfig, LogConfig, LogFormat, ReaperSettings, ServerConfig, StorageSettings,
};
pub use error::{AppError, AppResult};
