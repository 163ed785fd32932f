use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::session::SessionSettings;

/// Application configuration loaded from environment variables.
/// Everything has a default; the service runs on an in-memory store when
/// `DATABASE_URL` is not set.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    /// Snapshot export is enabled only when all S3 variables are present.
    pub s3: Option<S3Config>,
    pub autosave_quiet_ms: u64,
    pub drag_activation_px: f64,
    pub session_idle_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3 = match (
            optional_env("S3_BUCKET"),
            optional_env("S3_ENDPOINT"),
            optional_env("AWS_ACCESS_KEY_ID"),
            optional_env("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(bucket), Some(endpoint), Some(access_key_id), Some(secret_access_key)) => {
                Some(S3Config {
                    bucket,
                    endpoint,
                    access_key_id,
                    secret_access_key,
                })
            }
            _ => None,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            s3,
            autosave_quiet_ms: parse_env("AUTOSAVE_QUIET_MS", 2000)?,
            drag_activation_px: parse_env("DRAG_ACTIVATION_PX", 8.0)?,
            session_idle_secs: parse_env("SESSION_IDLE_SECS", 600)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            quiet_period: Duration::from_millis(self.autosave_quiet_ms),
            activation_distance: self.drag_activation_px,
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
