//! Tasks, schedules and saved task data as returned by the backend.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::node::{Node, SectionData};
use super::preferences::Preferences;
use super::settings::SettingsPatch;

/// Unsaved tasks and schedules are removed this many days after creation.
pub const SCHEDULE_EXPIRE_AFTER_DAYS: i64 = 30;

/// Generation status codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Processing,
    Done,
    Warning,
    Failed,
    Exception,
    Unknown(String),
}

impl From<String> for TaskStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "PD" => Self::Pending,
            "PS" => Self::Processing,
            "DN" => Self::Done,
            "WN" => Self::Warning,
            "FL" => Self::Failed,
            "EX" => Self::Exception,
            _ => Self::Unknown(code),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.code().to_string()
    }
}

impl TaskStatus {
    pub fn code(&self) -> &str {
        match self {
            Self::Pending => "PD",
            Self::Processing => "PS",
            Self::Done => "DN",
            Self::Warning => "WN",
            Self::Failed => "FL",
            Self::Exception => "EX",
            Self::Unknown(code) => code,
        }
    }

    /// The backend is still working on the task.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// The task produced schedules that can be browsed.
    pub fn has_schedules(&self) -> bool {
        matches!(self, Self::Done | Self::Warning)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_score: Option<f64>,
    #[serde(default)]
    pub sections: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How close an unsaved schedule is to being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWarning {
    /// Less than 30 minutes left (or already past due)
    RemovalImminent,
    /// Less than 5 days left
    ExpiresSoon,
}

/// Expiry warning for an item created at `created`.
pub fn expiry_warning(
    created: Option<DateTime<Utc>>,
    saved: bool,
    now: DateTime<Utc>,
) -> Option<ExpiryWarning> {
    if saved {
        return None;
    }
    let expire_at = created? + Duration::days(SCHEDULE_EXPIRE_AFTER_DAYS);
    let remaining = expire_at - now;
    if remaining < Duration::minutes(30) {
        Some(ExpiryWarning::RemovalImminent)
    } else if remaining < Duration::days(5) {
        Some(ExpiryWarning::ExpiresSoon)
    } else {
        None
    }
}

impl Schedule {
    pub fn expire_at(&self) -> Option<DateTime<Utc>> {
        self.created
            .map(|c| c + Duration::days(SCHEDULE_EXPIRE_AFTER_DAYS))
    }

    pub fn expiry_warning(&self, now: DateTime<Utc>) -> Option<ExpiryWarning> {
        expiry_warning(self.created, self.saved, now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of valid schedules found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<i64>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Schedules ordered by id.
    pub fn sorted_schedules(&self) -> Vec<&Schedule> {
        let mut schedules: Vec<&Schedule> = self.schedules.iter().collect();
        schedules.sort_by_key(|s| s.id);
        schedules
    }

    /// One-line status summary in the wording the service uses.
    pub fn status_message(&self) -> String {
        let message = self.message.as_deref().unwrap_or_default();
        match &self.status {
            TaskStatus::Pending => "Pending...".to_string(),
            TaskStatus::Processing => "Processing...".to_string(),
            TaskStatus::Done => format!(
                "Done! We found {} valid schedules and we picked the top {} for you.",
                self.count.unwrap_or(self.schedules.len() as i64),
                self.schedules.len()
            ),
            TaskStatus::Warning | TaskStatus::Failed => message.to_string(),
            TaskStatus::Exception => format!(
                "Sorry, we encountered an issue generating schedules for you, send us a message with this error code: {}.",
                message
            ),
            TaskStatus::Unknown(code) => format!("Unknown status {}", code),
        }
    }
}

/// A saved `{coursebin, preference, setting}` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub coursebin: Option<Vec<Node>>,
    #[serde(default)]
    pub preference: Option<Preferences>,
    #[serde(default)]
    pub setting: Option<SettingsPatch>,
}

/// Paginated list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A course as returned by the course endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePayload {
    pub name: String,
    pub term: String,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub sections: Vec<SectionData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        let task: Task = serde_json::from_value(json!({
            "id": 7,
            "status": "PS",
            "schedules": []
        }))
        .unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert!(task.status.is_in_progress());

        let odd: TaskStatus = serde_json::from_value(json!("ZZ")).unwrap();
        assert_eq!(odd, TaskStatus::Unknown("ZZ".into()));
        assert_eq!(serde_json::to_value(&odd).unwrap(), json!("ZZ"));
    }

    #[test]
    fn test_done_message() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "status": "DN",
            "count": 120,
            "schedules": [{"id": 3}, {"id": 2}]
        }))
        .unwrap();
        assert_eq!(
            task.status_message(),
            "Done! We found 120 valid schedules and we picked the top 2 for you."
        );
        let ids: Vec<i64> = task.sorted_schedules().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_expiry_warning() {
        let now: DateTime<Utc> = "2020-09-30T00:00:00Z".parse().unwrap();
        let fresh = now - Duration::days(1);
        let old = now - Duration::days(27);
        let ancient = now - Duration::days(40);

        assert_eq!(expiry_warning(Some(fresh), false, now), None);
        assert_eq!(
            expiry_warning(Some(old), false, now),
            Some(ExpiryWarning::ExpiresSoon)
        );
        assert_eq!(
            expiry_warning(Some(ancient), false, now),
            Some(ExpiryWarning::RemovalImminent)
        );
        assert_eq!(expiry_warning(Some(ancient), true, now), None);
    }
}
