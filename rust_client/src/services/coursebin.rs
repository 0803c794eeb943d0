//! Building the coursebin: fetching courses, keeping them fresh, and
//! saving or restoring the whole working set.

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinSet;

use crate::api::payloads::TaskDataUpdate;
use crate::api::SchedulerClient;
use crate::error::{ClientError, ClientResult};
use crate::models::node::Node;
use crate::models::settings::SettingsPatch;
use crate::models::task::{CoursePayload, TaskData};
use crate::store::{Action, StoreHandle};

/// Fetch a course from the registrar through the backend and add it to the
/// coursebin.
pub async fn fetch_course(
    client: &SchedulerClient,
    term: &str,
    course: &str,
) -> ClientResult<CoursePayload> {
    let course = course.trim();
    if course.is_empty() {
        return Err(ClientError::Validation("Course code is required".into()));
    }
    let payload = client.fetch_course(term, course).await?;
    log::info!(
        "Loaded {} ({} sections) for term {}",
        payload.name,
        payload.sections.len(),
        payload.term
    );
    client.store().dispatch(Action::AddCourse(payload.clone()));
    Ok(payload)
}

/// `(course, term)` of every course fetched longer than `lifetime` ago.
pub fn stale_courses(
    nodes: &[Node],
    lifetime: Duration,
    now: DateTime<Utc>,
) -> Vec<(String, String)> {
    nodes
        .iter()
        .filter_map(Node::as_course)
        .filter(|c| now - c.updated > lifetime)
        .map(|c| (c.course.clone(), c.term.clone()))
        .collect()
}

/// Outcome of [`refresh_stale`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub failed: Vec<(String, ClientError)>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Refetch stale courses concurrently. One course failing does not stop
/// the others.
pub async fn refresh_stale(
    client: &SchedulerClient,
    lifetime: Duration,
    now: DateTime<Utc>,
) -> RefreshReport {
    let stale = client.store().read(|s| stale_courses(&s.course, lifetime, now));
    let mut report = RefreshReport::default();
    if stale.is_empty() {
        return report;
    }
    log::info!("Refreshing {} stale course(s)", stale.len());

    let mut set = JoinSet::new();
    for (course, term) in stale {
        let client = client.clone();
        set.spawn(async move {
            let result = fetch_course(&client, &term, &course).await;
            (course, result)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((course, Ok(_))) => report.refreshed.push(course),
            Ok((course, Err(e))) => {
                log::warn!("Failed to refresh {}: {}", course, e);
                report.failed.push((course, e));
            }
            Err(e) => log::error!("Course refresh task panicked: {}", e),
        }
    }
    report
}

fn saved_task_data_id(store: &StoreHandle) -> ClientResult<i64> {
    store
        .read(|s| s.user.profile.as_ref().and_then(|p| p.saved_task_data))
        .ok_or(ClientError::NotLoggedIn)
}

/// Replace the coursebin, preferences and settings with a saved record.
/// Missing parts of the record leave the current value alone.
pub fn apply_task_data(store: &StoreHandle, data: TaskData) {
    store.dispatch(Action::LoadCoursebin(data.coursebin));
    store.dispatch(Action::LoadPreferences(data.preference));
    store.dispatch(Action::LoadSetting(data.setting));
}

/// Upload the current coursebin, preferences and settings to the user's
/// saved record.
pub async fn save_task_data(client: &SchedulerClient) -> ClientResult<TaskData> {
    let id = saved_task_data_id(client.store())?;
    let state = client.store().get();
    let update = TaskDataUpdate {
        coursebin: &state.course,
        preference: &state.preference,
        setting: SettingsPatch::from(&state.setting),
    };
    let saved = client.update_task_data(id, &update).await?;
    log::info!("Saved coursebin to task data {}", id);
    Ok(saved)
}

/// Restore the user's saved record into the store.
pub async fn load_saved_task_data(client: &SchedulerClient) -> ClientResult<()> {
    let id = saved_task_data_id(client.store())?;
    load_request_data(client, id).await
}

/// Restore the inputs a task or schedule was generated from.
pub async fn load_request_data(client: &SchedulerClient, id: i64) -> ClientResult<()> {
    let data = client.get_task_data(id).await?;
    apply_task_data(client.store(), data);
    log::info!("Loaded task data {}", id);
    Ok(())
}

fn request_data_id(kind: &str, id: i64, request_data: Option<i64>) -> ClientResult<i64> {
    request_data.ok_or_else(|| {
        ClientError::Validation(format!("{} {} has no saved request data", kind, id))
    })
}

/// Restore the inputs task `task_id` was generated from.
pub async fn load_task_inputs(client: &SchedulerClient, task_id: i64) -> ClientResult<i64> {
    let task = client.get_task(task_id).await?;
    let data_id = request_data_id("Task", task_id, task.request_data)?;
    load_request_data(client, data_id).await?;
    Ok(data_id)
}

/// Restore the inputs schedule `schedule_id` was generated from.
pub async fn load_schedule_inputs(
    client: &SchedulerClient,
    schedule_id: i64,
) -> ClientResult<i64> {
    let schedule = client.get_schedule(schedule_id).await?;
    let data_id = request_data_id("Schedule", schedule_id, schedule.request_data)?;
    load_request_data(client, data_id).await?;
    Ok(data_id)
}

/// Re-apply the clearance and penalty selectors from the settings.
pub fn apply_filters(store: &StoreHandle) {
    let setting = store.read(|s| s.setting.clone());
    store.dispatch(Action::FilterSelection {
        exclude_closed: setting.exclude_closed,
        cleared_only: setting.cleared_only,
        cleared_sections: setting.cleared_sections,
    });
    store.dispatch(Action::FilterPenalize(setting.exempted_sections));
}
