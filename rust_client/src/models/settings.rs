//! Coursebin settings: the current term, filter inputs and list toggles.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Term selected when nothing else is configured.
pub const DEFAULT_TERM: &str = "20203";

/// Terms offered by the backend, newest first.
pub const TERM_OPTIONS: &[(&str, &str)] = &[
    ("20203", "Fall 2020"),
    ("20202", "Summer 2020"),
    ("20201", "Spring 2020"),
];

/// Human-readable label of a term code.
pub fn term_label(code: &str) -> Option<&'static str> {
    TERM_OPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Course code last typed into the add-course form
    pub course: String,
    pub term: String,
    pub tools_open: bool,
    /// Selector of sections the user has clearance for
    pub cleared_sections: String,
    pub cleared_only: bool,
    pub exclude_closed: bool,
    /// Selector of sections exempt from penalties
    pub exempted_sections: String,
    pub saved_only: bool,
    pub public_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            course: String::new(),
            term: DEFAULT_TERM.to_string(),
            tools_open: false,
            cleared_sections: String::new(),
            cleared_only: false,
            exclude_closed: false,
            exempted_sections: String::new(),
            saved_only: false,
            public_only: false,
        }
    }
}

/// Partial settings, as stored in saved task data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_sections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_closed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exempted_sections: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_only: Option<bool>,
}

impl From<&Settings> for SettingsPatch {
    fn from(s: &Settings) -> Self {
        Self {
            course: Some(s.course.clone()),
            term: Some(s.term.clone()),
            tools_open: Some(s.tools_open),
            cleared_sections: Some(s.cleared_sections.clone()),
            cleared_only: Some(s.cleared_only),
            exclude_closed: Some(s.exclude_closed),
            exempted_sections: Some(s.exempted_sections.clone()),
            saved_only: Some(s.saved_only),
            public_only: Some(s.public_only),
        }
    }
}

/// A single setting change.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingEdit {
    Course(String),
    Term(String),
    ToolsOpen(bool),
    ClearedSections(String),
    ClearedOnly(bool),
    ExcludeClosed(bool),
    ExemptedSections(String),
    SavedOnly(bool),
    PublicOnly(bool),
}

impl SettingEdit {
    /// Build an edit from a field name (camelCase or snake_case) and a value.
    pub fn parse(name: &str, value: &str) -> ClientResult<Self> {
        let flag = || match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(ClientError::Validation(format!(
                "expected true or false for '{}', got '{}'",
                name, value
            ))),
        };
        let text = || value.to_string();

        match name {
            "course" => Ok(Self::Course(text())),
            "term" => Ok(Self::Term(text())),
            "toolsOpen" | "tools_open" => Ok(Self::ToolsOpen(flag()?)),
            "clearedSections" | "cleared_sections" => Ok(Self::ClearedSections(text())),
            "clearedOnly" | "cleared_only" => Ok(Self::ClearedOnly(flag()?)),
            "excludeClosed" | "exclude_closed" => Ok(Self::ExcludeClosed(flag()?)),
            "exemptedSections" | "exempted_sections" => Ok(Self::ExemptedSections(text())),
            "savedOnly" | "saved_only" => Ok(Self::SavedOnly(flag()?)),
            "publicOnly" | "public_only" => Ok(Self::PublicOnly(flag()?)),
            other => Err(ClientError::Validation(format!("unknown setting '{}'", other))),
        }
    }
}

impl Settings {
    pub fn apply(&mut self, edit: SettingEdit) {
        match edit {
            SettingEdit::Course(v) => self.course = v,
            SettingEdit::Term(v) => self.term = v,
            SettingEdit::ToolsOpen(v) => self.tools_open = v,
            SettingEdit::ClearedSections(v) => self.cleared_sections = v,
            SettingEdit::ClearedOnly(v) => self.cleared_only = v,
            SettingEdit::ExcludeClosed(v) => self.exclude_closed = v,
            SettingEdit::ExemptedSections(v) => self.exempted_sections = v,
            SettingEdit::SavedOnly(v) => self.saved_only = v,
            SettingEdit::PublicOnly(v) => self.public_only = v,
        }
    }

    /// Overlay the fields present in `patch`.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.course {
            self.course = v;
        }
        if let Some(v) = patch.term {
            self.term = v;
        }
        if let Some(v) = patch.tools_open {
            self.tools_open = v;
        }
        if let Some(v) = patch.cleared_sections {
            self.cleared_sections = v;
        }
        if let Some(v) = patch.cleared_only {
            self.cleared_only = v;
        }
        if let Some(v) = patch.exclude_closed {
            self.exclude_closed = v;
        }
        if let Some(v) = patch.exempted_sections {
            self.exempted_sections = v;
        }
        if let Some(v) = patch.saved_only {
            self.saved_only = v;
        }
        if let Some(v) = patch.public_only {
            self.public_only = v;
        }
    }
}
