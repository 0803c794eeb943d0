//! Session tokens and the signed-in user's profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JWT pair issued by the token endpoints.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

// Tokens must never end up in logs.
impl std::fmt::Debug for Tokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Tokens")
            .field("access", &mask(&self.access))
            .field("refresh", &mask(&self.refresh))
            .finish()
    }
}

/// Partial token update; the refresh endpoint only returns `access`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl std::fmt::Debug for TokenPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPatch")
            .field("access", &self.access.is_some())
            .field("refresh", &self.refresh.is_some())
            .finish()
    }
}

impl Tokens {
    pub fn merge(&mut self, patch: TokenPatch) {
        if patch.access.is_some() {
            self.access = patch.access;
        }
        if patch.refresh.is_some() {
            self.refresh = patch.refresh;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Id of the task-data record holding the user's saved coursebin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_task_data: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Display name, falling back to the username.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub tokens: Tokens,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl UserState {
    pub fn is_logged_in(&self) -> bool {
        self.tokens.access.is_some()
    }
}
