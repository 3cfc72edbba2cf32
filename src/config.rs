//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The Telegram bot token is referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub storage: StorageConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Fast liveness check interval.
    pub status_interval_secs: u64,
    /// Slower transaction-feed sync interval.
    pub wallet_interval_secs: u64,
    /// Connect/read bound for every outbound HTTP call.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Rig list written by the external setup flow.
    pub rigs_file: String,
    /// Per-chat transaction cursors owned by this daemon.
    pub cursors_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token_env: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
