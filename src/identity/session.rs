use super::profile::Profile;

pub type SessionToken = String;

pub const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Client-held record of an authenticated user.
///
/// There is no expiry: a session lives until it is cleared from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub token_type: String,
    pub profile: Option<Profile>,
}

impl Session {
    pub fn new(token: impl Into<SessionToken>, token_type: Option<String>, profile: Option<Profile>) -> Self {
        let token_type = token_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        Self { token: token.into(), token_type, profile }
    }

    pub fn has_token(&self) -> bool { !self.token.trim().is_empty() }

    /// Value for the `Authorization` header. The backend only accepts the bearer scheme.
    pub fn authorization(&self) -> String { format!("Bearer {}", self.token) }
}
