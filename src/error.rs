//! Unified client error model.
//! Every operation that talks to the backend or the credential store returns `AppResult`;
//! screens turn the error into a user-facing message with `user_message`.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Field name → message, ordered so output is stable.
pub type FieldErrors = BTreeMap<String, String>;

pub const MSG_CONNECTION: &str = "Connection error. Check your connection and try again.";
pub const MSG_MALFORMED: &str = "The server returned malformed data. Check that the backend URL is correct.";
pub const MSG_BACKEND_FALLBACK: &str = "Unknown server error";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Local pre-flight check failed; no request was sent.
    Validation { code: String, message: String, fields: FieldErrors },
    /// Non-2xx response. `detail` is the server-provided message, when there was one.
    Backend { code: String, status: u16, detail: Option<String> },
    /// Response body was not the JSON we expected.
    Parse { code: String, message: String },
    /// The request never completed.
    Network { code: String, message: String },
    /// Operation needs a session and there is none.
    Auth { code: String, message: String },
    Storage { code: String, message: String },
    Config { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Backend { code, .. }
            | AppError::Parse { code, .. }
            | AppError::Network { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Config { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Parse { message, .. }
            | AppError::Network { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Config { message, .. } => message.as_str(),
            AppError::Backend { detail, .. } => detail.as_deref().unwrap_or(MSG_BACKEND_FALLBACK),
        }
    }

    pub fn validation(fields: FieldErrors) -> Self {
        let message = fields.values().next().cloned().unwrap_or_else(|| "invalid input".to_string());
        AppError::Validation { code: "validation".into(), message, fields }
    }
    pub fn invalid_field<S: Into<String>>(field: S, msg: S) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), msg.into());
        Self::validation(fields)
    }
    pub fn backend(status: u16, detail: Option<String>) -> Self { AppError::Backend { code: "backend".into(), status, detail } }
    pub fn parse<S: Into<String>>(code: S, msg: S) -> Self { AppError::Parse { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AppError::Network { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AppError::Config { code: code.into(), message: msg.into() } }

    /// Per-field messages for validation failures; empty for every other kind.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            AppError::Validation { fields, .. } => fields.clone(),
            _ => FieldErrors::new(),
        }
    }

    pub fn is_validation(&self) -> bool { matches!(self, AppError::Validation { .. }) }

    /// Text shown to the user. Backend errors use the server detail verbatim, or
    /// `fallback` when the server gave none.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            AppError::Backend { detail: Some(d), .. } => d.clone(),
            AppError::Backend { detail: None, .. } => fallback.to_string(),
            AppError::Parse { .. } => MSG_MALFORMED.to_string(),
            AppError::Network { .. } => MSG_CONNECTION.to_string(),
            other => other.message().to_string(),
        }
    }

    pub fn user_message(&self) -> String { self.user_message_or(MSG_BACKEND_FALLBACK) }

    /// Status the error corresponds to, for logging alongside backend statuses.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 400,
            AppError::Backend { status, .. } => *status,
            AppError::Parse { .. } => 502,
            AppError::Network { .. } => 503,
            AppError::Auth { .. } => 401,
            AppError::Storage { .. } | AppError::Config { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Backend { status, .. } => write!(f, "{} ({}): {}", self.code_str(), status, self.message()),
            _ => write!(f, "{}: {}", self.code_str(), self.message()),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::parse("malformed_response", err.to_string().as_str())
        } else {
            AppError::network("request_failed", err.to_string().as_str())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::parse("malformed_response", err.to_string().as_str())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::storage("io", err.to_string().as_str())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: file plumbing in the credential store is the only anyhow source
        AppError::Storage { code: "storage_error".into(), message: format!("{:#}", err) }
    }
}
