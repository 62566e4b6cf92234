//!
//! escuela credential store
//! ------------------------
//! Durable key/value storage for the client session. A session is persisted as a
//! single JSON document with three keys:
//!
//! - `access_token`: the opaque bearer token
//! - `token_type`: the credential scheme tag returned by the backend
//! - `user_info`: the cached profile, itself serialized as a JSON string
//!
//! Stores keep exactly what they are given: no encryption, no expiry metadata.
//! `FileCredentialStore` writes the document through a temporary file and a rename,
//! so a reader never observes a half-written or half-cleared session.
//! `MemoryCredentialStore` is the in-process fake used by tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::identity::{Profile, Session};

pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_TOKEN_TYPE: &str = "token_type";
pub const KEY_USER_INFO: &str = "user_info";

const DOCUMENT_NAME: &str = "credentials.json";

/// Persistent home of the current session.
pub trait CredentialStore: Send + Sync {
    fn save(&self, session: &Session) -> AppResult<()>;
    fn load(&self) -> AppResult<Option<Session>>;
    /// Remove all keys. Clearing an empty store is not an error.
    fn clear(&self) -> AppResult<()>;
}

/// Handle injected into the controller, gate, router and dispatcher.
pub type SharedCredentials = Arc<dyn CredentialStore>;

/// On-disk layout of the persisted keys.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_info: Option<String>,
}

impl StoredEntries {
    fn from_session(session: &Session) -> AppResult<Self> {
        let user_info = match &session.profile {
            Some(p) => Some(serde_json::to_string(p)?),
            None => None,
        };
        Ok(Self {
            access_token: Some(session.token.clone()),
            token_type: Some(session.token_type.clone()),
            user_info,
        })
    }

    fn into_session(self) -> Option<Session> {
        let token = self.access_token?;
        // A corrupt profile must not lock the user out; drop it and keep the token.
        let profile = self.user_info.and_then(|raw| match serde_json::from_str::<Profile>(&raw) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(target: "escuela::storage", "discarding unreadable user_info: {}", e);
                None
            }
        });
        Some(Session {
            token,
            token_type: self.token_type.unwrap_or_default(),
            profile,
        })
    }
}

/// Credential store backed by one JSON document under a per-profile directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    /// Directory owned by one client profile.
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Open (and create if needed) the store for `profile` under `root`.
    pub fn open<P: AsRef<Path>>(root: P, profile: &str) -> AppResult<Self> {
        let dir = root.as_ref().join(sanitize_profile(profile));
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create credential directory {}", dir.display()))?;
        debug!(target: "escuela::storage", "credential store at '{}'", dir.display());
        Ok(Self { dir })
    }

    pub fn document_path(&self) -> PathBuf { self.dir.join(DOCUMENT_NAME) }

    fn temp_path(&self) -> PathBuf { self.dir.join(format!("{}.tmp", DOCUMENT_NAME)) }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, session: &Session) -> AppResult<()> {
        let entries = StoredEntries::from_session(session)?;
        let body = serde_json::to_string_pretty(&entries)?;
        let tmp = self.temp_path();
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, self.document_path())
            .with_context(|| format!("failed to replace {}", self.document_path().display()))?;
        debug!(target: "escuela::storage", "save: token_type='{}' profile={}", session.token_type, session.profile.is_some());
        Ok(())
    }

    fn load(&self) -> AppResult<Option<Session>> {
        let path = self.document_path();
        if !path.exists() { return Ok(None); }
        let raw = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let entries: StoredEntries = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(e) => {
                warn!(target: "escuela::storage", "credential document '{}' is unreadable, treating as signed out: {}", path.display(), e);
                return Ok(None);
            }
        };
        Ok(entries.into_session())
    }

    fn clear(&self) -> AppResult<()> {
        let path = self.document_path();
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let tmp = self.temp_path();
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(target: "escuela::storage", "clear: could not remove '{}': {}", tmp.display(), e);
            }
        }
        debug!(target: "escuela::storage", "clear: removed '{}'", path.display());
        Ok(())
    }
}

/// Keep profile names usable as a single path component.
fn sanitize_profile(profile: &str) -> String {
    let cleaned: String = profile
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() { "default".to_string() } else { cleaned }
}

/// In-memory store; same semantics as the file store minus durability.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Session>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_session(session: Session) -> Self { Self { inner: RwLock::new(Some(session)) } }

    pub fn shared() -> SharedCredentials { Arc::new(Self::new()) }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, session: &Session) -> AppResult<()> {
        *self.inner.write() = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> AppResult<Option<Session>> { Ok(self.inner.read().clone()) }

    fn clear(&self) -> AppResult<()> {
        *self.inner.write() = None;
        Ok(())
    }
}
