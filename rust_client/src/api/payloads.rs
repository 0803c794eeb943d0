//! Request bodies.

use serde::Serialize;

use crate::models::node::Node;
use crate::models::preferences::Preferences;
use crate::models::settings::SettingsPatch;

#[derive(Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Body of a schedule generation request.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask<'a> {
    pub coursebin: &'a [Node],
    pub preference: &'a Preferences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub description: String,
}

/// Saved `{coursebin, preference, setting}` record update.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDataUpdate<'a> {
    pub coursebin: &'a [Node],
    pub preference: &'a Preferences,
    pub setting: SettingsPatch,
}

/// Editable task and schedule fields; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// Profile changes; a password change needs the old password too.
#[derive(Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_password: Option<String>,
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdate")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password", &self.password.is_some())
            .finish()
    }
}

/// Which schedules to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub page: u32,
    pub saved_only: bool,
    pub public_only: bool,
}

impl Default for ScheduleFilter {
    fn default() -> Self {
        Self {
            page: 1,
            saved_only: false,
            public_only: false,
        }
    }
}
