//! Local application state.
//!
//! All client state lives in a single [`Store`] made of five slices. The
//! store only changes through [`Action`]s passed to [`Store::dispatch`], so
//! every mutation is a named, loggable event. [`StoreHandle`] shares a store
//! between async tasks and optionally snapshots it to disk after each
//! dispatch.

pub mod checksum;
pub mod course;
pub mod persist;


use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::node::Node;
use crate::models::preferences::{PreferenceEdit, Preferences, ReservedSlot};
use crate::models::settings::{SettingEdit, Settings, SettingsPatch};
use crate::models::task::{CoursePayload, Task};
use crate::models::user::{TokenPatch, UserProfile, UserState};

/// Every state change the client can make.
#[derive(Debug, Clone)]
pub enum Action {
    // Coursebin
    AddCourse(CoursePayload),
    ToggleCourseInclude(String),
    ToggleCoursePenalize(String),
    RecursiveSetPenalize { node_id: String, exempt: bool },
    DeleteCourse(String),
    SetIncludeCourse(bool),
    SetGroupCourse { node_id: String, group: u32 },
    ResetCourseGroup,
    StartGroupFromOne,
    LoadCoursebin(Option<Vec<Node>>),
    FilterSelection {
        exclude_closed: bool,
        cleared_only: bool,
        cleared_sections: String,
    },
    FilterPenalize(String),

    // Preferences
    EditPreferences(PreferenceEdit),
    AddReservedSlot(ReservedSlot),
    RemoveReservedSlot(Vec<String>),
    LoadPreferences(Option<Preferences>),

    // Task result
    SaveTaskResult(Option<Task>),

    // User session
    SetUserTokens(TokenPatch),
    SetUserProfile(Option<UserProfile>),
    ClearUserState,

    // Settings
    EditSetting(SettingEdit),
    LoadSetting(Option<SettingsPatch>),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddCourse(_) => "add_course",
            Action::ToggleCourseInclude(_) => "toggle_course_include",
            Action::ToggleCoursePenalize(_) => "toggle_course_penalize",
            Action::RecursiveSetPenalize { .. } => "recursive_set_penalize",
            Action::DeleteCourse(_) => "delete_course",
            Action::SetIncludeCourse(_) => "set_include_course",
            Action::SetGroupCourse { .. } => "set_group_course",
            Action::ResetCourseGroup => "reset_course_group",
            Action::StartGroupFromOne => "start_group_from_one",
            Action::LoadCoursebin(_) => "load_coursebin",
            Action::FilterSelection { .. } => "filter_selection",
            Action::FilterPenalize(_) => "filter_penalize",
            Action::EditPreferences(_) => "edit_preferences",
            Action::AddReservedSlot(_) => "add_reserved_slot",
            Action::RemoveReservedSlot(_) => "remove_reserved_slot",
            Action::LoadPreferences(_) => "load_preferences",
            Action::SaveTaskResult(_) => "save_task_result",
            Action::SetUserTokens(_) => "set_user_tokens",
            Action::SetUserProfile(_) => "set_user_profile",
            Action::ClearUserState => "clear_user_state",
            Action::EditSetting(_) => "edit_setting",
            Action::LoadSetting(_) => "load_setting",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub course: Vec<Node>,
    pub preference: Preferences,
    pub task_result: Option<Task>,
    pub user: UserState,
    pub setting: Settings,
}

impl Store {
    pub fn dispatch(&mut self, action: Action) {
        log::debug!("dispatch {}", action.name());
        match action {
            Action::AddCourse(payload) => course::add_course(&mut self.course, &payload),
            Action::ToggleCourseInclude(id) => course::toggle_include(&mut self.course, &id),
            Action::ToggleCoursePenalize(id) => course::toggle_penalize(&mut self.course, &id),
            Action::RecursiveSetPenalize { node_id, exempt } => {
                course::recursive_set_penalize(&mut self.course, &node_id, exempt)
            }
            Action::DeleteCourse(name) => course::delete_course(&mut self.course, &name),
            Action::SetIncludeCourse(include) => course::set_include_all(&mut self.course, include),
            Action::SetGroupCourse { node_id, group } => {
                course::set_group(&mut self.course, &node_id, group)
            }
            Action::ResetCourseGroup => course::reset_groups(&mut self.course),
            Action::StartGroupFromOne => course::compact_groups(&mut self.course),
            Action::LoadCoursebin(nodes) => {
                if let Some(nodes) = nodes {
                    self.course = nodes;
                }
            }
            Action::FilterSelection {
                exclude_closed,
                cleared_only,
                cleared_sections,
            } => course::filter_selection(
                &mut self.course,
                exclude_closed,
                cleared_only,
                &cleared_sections,
            ),
            Action::FilterPenalize(selector) => course::filter_penalize(&mut self.course, &selector),

            Action::EditPreferences(edit) => self.preference.apply(edit),
            Action::AddReservedSlot(slot) => self.preference.reserved.push(slot),
            Action::RemoveReservedSlot(keys) => {
                self.preference.reserved.retain(|r| !keys.contains(&r.key))
            }
            Action::LoadPreferences(preference) => {
                if let Some(preference) = preference {
                    self.preference = preference;
                }
            }

            Action::SaveTaskResult(task) => self.task_result = task,

            Action::SetUserTokens(patch) => self.user.tokens.merge(patch),
            Action::SetUserProfile(profile) => self.user.profile = profile,
            Action::ClearUserState => self.user = UserState::default(),

            Action::EditSetting(edit) => self.setting.apply(edit),
            Action::LoadSetting(patch) => {
                if let Some(patch) = patch {
                    self.setting.merge(patch);
                }
            }
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.user.tokens.access.as_deref()
    }
}

/// Shared, optionally persistent store.
#[derive(Clone, Default)]
pub struct StoreHandle {
    state: Arc<RwLock<Store>>,
    snapshot_path: Option<Arc<PathBuf>>,
}

impl StoreHandle {
    /// In-memory store, nothing is written to disk.
    pub fn new(store: Store) -> Self {
        Self {
            state: Arc::new(RwLock::new(store)),
            snapshot_path: None,
        }
    }

    /// Store backed by a snapshot file.
    ///
    /// The snapshot is loaded if it exists and is intact; otherwise the
    /// store starts from defaults. Every later dispatch rewrites the file.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let store = persist::load_snapshot(&path).unwrap_or_default();
        Self {
            state: Arc::new(RwLock::new(store)),
            snapshot_path: Some(Arc::new(path)),
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref().map(PathBuf::as_path)
    }

    /// Apply an action and persist the result.
    ///
    /// A failed snapshot write is logged; the in-memory state still changes.
    pub fn dispatch(&self, action: Action) {
        let mut state = self.state.write();
        state.dispatch(action);
        if let Some(path) = &self.snapshot_path {
            if let Err(e) = persist::save_snapshot(path, &state) {
                log::warn!("Failed to persist state to {}: {}", path.display(), e);
            }
        }
    }

    /// Run `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        f(&self.state.read())
    }

    /// Clone of the current state.
    pub fn get(&self) -> Store {
        self.state.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(|s| s.access_token().map(str::to_string))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(|s| s.user.tokens.refresh.clone())
    }
}
