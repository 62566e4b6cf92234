//! Client configuration: backend URL, credential profile and state directory.
//!
//! Values come from the environment (`ESCUELA_API_URL`, `ESCUELA_PROFILE`,
//! `ESCUELA_STATE_DIR`); the binary layers command-line flags on top.

use std::path::PathBuf;

use reqwest::Url;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const ENV_API_URL: &str = "ESCUELA_API_URL";
pub const ENV_PROFILE: &str = "ESCUELA_PROFILE";
pub const ENV_STATE_DIR: &str = "ESCUELA_STATE_DIR";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const STATE_DIR_NAME: &str = ".escuela";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    /// Credential scope; each profile has its own stored session.
    pub profile: String,
    pub state_dir: PathBuf,
    /// Keep the session in memory only; nothing is written to `state_dir`.
    pub ephemeral: bool,
}

fn default_profile() -> String {
    let user = whoami::username();
    if user.trim().is_empty() { "default".to_string() } else { user }
}

fn default_state_dir() -> PathBuf {
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join(STATE_DIR_NAME),
        None => PathBuf::from(STATE_DIR_NAME),
    }
}

pub fn parse_api_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| AppError::config("invalid_api_url", format!("'{}': {}", raw, e).as_str()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::config("invalid_api_url", format!("unsupported scheme '{}' in '{}'", other, raw).as_str())),
    }
}

impl ClientConfig {
    /// Read the environment, falling back to defaults for anything unset or blank.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> AppResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_url = parse_api_url(get(ENV_API_URL).as_deref().unwrap_or(DEFAULT_API_URL))?;
        let profile = get(ENV_PROFILE).unwrap_or_else(default_profile);
        let state_dir = get(ENV_STATE_DIR).map(PathBuf::from).unwrap_or_else(default_state_dir);
        let cfg = Self { api_url, profile, state_dir, ephemeral: false };
        debug!(target: "escuela::config", "config: api={} profile={} state_dir={}", cfg.api_url, cfg.profile, cfg.state_dir.display());
        Ok(cfg)
    }

    pub fn with_api_url(mut self, raw: &str) -> AppResult<Self> {
        self.api_url = parse_api_url(raw)?;
        Ok(self)
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = profile.to_string();
        self
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    pub fn ephemeral(mut self, on: bool) -> Self {
        self.ephemeral = on;
        self
    }
}
