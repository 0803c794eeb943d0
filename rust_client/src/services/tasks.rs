//! Submitting generation tasks and waiting for their results.
//!
//! The backend generates schedules asynchronously. After a task is created
//! the client polls it with exponential backoff, saving every response as
//! the current task result so that an interrupted wait can be resumed
//! later with [`resume`].

use std::time::Duration;

use crate::api::payloads::NewTask;
use crate::api::SchedulerClient;
use crate::error::{ClientError, ClientResult};
use crate::models::node::Node;
use crate::models::task::Task;
use crate::store::course::included_course_names;
use crate::store::Action;

/// Shown when a task is still running after the last poll.
pub const POLL_EXHAUSTED_MESSAGE: &str =
    "It's taking a bit longer than expected... Go to the Task page for updates.";

/// Upper bound for the delay between polls.
pub const MAX_POLL_DELAY: Duration = Duration::from_secs(60);

/// Retry budget and first delay of a polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Polls allowed after the first one
    pub retries: u32,
    pub initial_delay: Duration,
}

impl PollConfig {
    /// Polling right after a task was submitted.
    pub const AFTER_SUBMIT: PollConfig = PollConfig {
        retries: 10,
        initial_delay: Duration::from_millis(500),
    };

    /// Polling a task left in progress by an earlier session.
    pub const ON_RESUME: PollConfig = PollConfig {
        retries: 5,
        initial_delay: Duration::from_millis(1000),
    };

    /// Delays slept between consecutive polls.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        std::iter::successors(Some(self.initial_delay), |d| Some(next_delay(*d)))
            .take(self.retries as usize)
    }
}

pub fn next_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_POLL_DELAY)
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The task left the pending/processing states
    Finished(Task),
    /// Retries ran out while the task was still in progress
    Exhausted(Task),
}

impl PollOutcome {
    pub fn task(&self) -> &Task {
        match self {
            PollOutcome::Finished(task) | PollOutcome::Exhausted(task) => task,
        }
    }

    /// Status line for the user.
    pub fn message(&self) -> String {
        match self {
            PollOutcome::Finished(task) => task.status_message(),
            PollOutcome::Exhausted(_) => POLL_EXHAUSTED_MESSAGE.to_string(),
        }
    }
}

/// `CSCI-356, MATH-225` for the included courses.
pub fn task_description(nodes: &[Node]) -> String {
    included_course_names(nodes)
        .into_iter()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn sleep(client: &SchedulerClient, delay: Duration) -> ClientResult<()> {
    tokio::select! {
        _ = client.cancel_token().cancelled() => Err(ClientError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Poll task `id` until it finishes or the retry budget runs out.
pub async fn poll(
    client: &SchedulerClient,
    id: i64,
    config: PollConfig,
) -> ClientResult<PollOutcome> {
    let mut retries = config.retries;
    let mut delay = config.initial_delay;
    loop {
        let task = client.get_task(id).await?;
        client.store().dispatch(Action::SaveTaskResult(Some(task.clone())));

        if !task.status.is_in_progress() {
            log::info!("Task {} finished with status {}", id, task.status.code());
            return Ok(PollOutcome::Finished(task));
        }
        if retries == 0 {
            log::warn!("Task {} still {} after polling, giving up", id, task.status.code());
            return Ok(PollOutcome::Exhausted(task));
        }

        log::debug!("Task {} is {}, next poll in {:?}", id, task.status.code(), delay);
        sleep(client, delay).await?;
        retries -= 1;
        delay = next_delay(delay);
    }
}

/// Send the current coursebin and preferences for generation and wait for
/// the result.
pub async fn submit(client: &SchedulerClient, name: Option<&str>) -> ClientResult<PollOutcome> {
    submit_with(client, name, PollConfig::AFTER_SUBMIT).await
}

pub async fn submit_with(
    client: &SchedulerClient,
    name: Option<&str>,
    config: PollConfig,
) -> ClientResult<PollOutcome> {
    let state = client.store().get();
    if state.course.is_empty() {
        return Err(ClientError::Validation("The coursebin is empty".into()));
    }

    client.store().dispatch(Action::SaveTaskResult(None));
    let request = NewTask {
        coursebin: &state.course,
        preference: &state.preference,
        name: name.filter(|n| !n.is_empty()),
        description: task_description(&state.course),
    };
    let task = client.create_task(&request).await?;
    log::info!("Created task {}", task.id);
    client.store().dispatch(Action::SaveTaskResult(Some(task.clone())));

    if task.status.is_in_progress() {
        poll(client, task.id, config).await
    } else {
        Ok(PollOutcome::Finished(task))
    }
}

/// Keep waiting on a stored task result that was still in progress.
/// `None` when there is nothing to resume.
pub async fn resume(client: &SchedulerClient) -> ClientResult<Option<PollOutcome>> {
    resume_with(client, PollConfig::ON_RESUME).await
}

pub async fn resume_with(
    client: &SchedulerClient,
    config: PollConfig,
) -> ClientResult<Option<PollOutcome>> {
    let pending = client.store().read(|s| {
        s.task_result
            .as_ref()
            .filter(|t| t.status.is_in_progress())
            .map(|t| t.id)
    });
    match pending {
        Some(id) => {
            log::info!("Resuming task {}", id);
            poll(client, id, config).await.map(Some)
        }
        None => Ok(None),
    }
}
