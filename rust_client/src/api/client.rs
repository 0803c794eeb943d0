//! Typed access to the scheduler backend.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::auth::{AuthInterceptor, TokenEndpoints, Unauthorized};
use super::payloads::{
    Credentials, ItemUpdate, NewTask, ProfileUpdate, ScheduleFilter, TaskDataUpdate,
};
use super::request::{ApiRequest, AuthMode};
use crate::config::ClientConfig;
use crate::error::{decode_value, ApiError, ClientError, ClientResult};
use crate::models::task::{CoursePayload, Page, Schedule, Task, TaskData};
use crate::models::user::{TokenPatch, Tokens, UserProfile};
use crate::naming::join_url;
use crate::store::StoreHandle;
use crate::transport::{HttpRequest, HttpResponse, Transport};

struct ClientInner {
    transport: Arc<dyn Transport>,
    auth: AuthInterceptor,
    base_url: String,
    timeout: Duration,
    course_timeout: Duration,
}

/// Backend client.
///
/// Cheap to clone. Clones share the transport, the store and the refresh
/// lock; [`with_cancel_token`](Self::with_cancel_token) gives a clone whose
/// requests stop when that token is cancelled.
#[derive(Clone)]
pub struct SchedulerClient {
    inner: Arc<ClientInner>,
    cancel: CancellationToken,
}

fn into_result(response: HttpResponse) -> ClientResult<Value> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(ClientError::Api(ApiError::new(
            response.status,
            response.status_text,
            response.body,
        )))
    }
}

impl SchedulerClient {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, store: StoreHandle) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                auth: AuthInterceptor::new(store),
                base_url: config.server.base_url.clone(),
                timeout: config.timeout(),
                course_timeout: config.course_timeout(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// A clone whose requests are aborted when `token` is cancelled.
    pub fn with_cancel_token(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: token,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn store(&self) -> &StoreHandle {
        self.inner.auth.store()
    }

    fn url_for(&self, request: &ApiRequest) -> ClientResult<String> {
        let url = join_url(&self.inner.base_url, &request.path);
        if request.query.is_empty() {
            return Ok(url);
        }
        let mut parsed = reqwest::Url::parse(&url)
            .map_err(|e| ClientError::Config(format!("Invalid URL {}: {}", url, e)))?;
        parsed.query_pairs_mut().extend_pairs(&request.query);
        Ok(parsed.into())
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> ClientResult<HttpResponse> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let http = HttpRequest {
            method: request.method,
            url: self.url_for(request)?,
            bearer,
            body: request.body.clone(),
            timeout: request.timeout.unwrap_or(self.inner.timeout),
        };
        tokio::select! {
            _ = self.cancel.cancelled() => {
                log::debug!("{} {} cancelled", request.method, request.path);
                Err(ClientError::Cancelled)
            }
            result = self.inner.transport.send(http) => Ok(result?),
        }
    }

    /// Send a request, refreshing the session once if the access token was
    /// rejected.
    pub async fn execute(&self, request: ApiRequest) -> ClientResult<Value> {
        let token = self.inner.auth.token_for(&request.auth);
        let response = self.send_once(&request, token.clone()).await?;

        let response = match (&request.auth, token) {
            (AuthMode::Session, Some(sent)) if response.status == 401 => {
                match self
                    .inner
                    .auth
                    .on_unauthorized(self, &sent, Utc::now())
                    .await
                {
                    Unauthorized::Retry => {
                        log::debug!("Retrying {} with a new token", request.path);
                        let token = self.inner.auth.token_for(&request.auth);
                        self.send_once(&request, token).await?
                    }
                    Unauthorized::PassThrough => response,
                }
            }
            _ => response,
        };

        into_result(response)
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        decode_value(self.execute(request).await?)
    }

    async fn call_empty(&self, request: ApiRequest) -> ClientResult<()> {
        self.execute(request).await.map(|_| ())
    }

    // Tokens

    pub async fn obtain_token(&self, username: &str, password: &str) -> ClientResult<Tokens> {
        let request = ApiRequest::post("api/token/")
            .anonymous()
            .json(&Credentials { username, password })?;
        self.call(request).await
    }

    pub async fn invalidate_token(&self) -> ClientResult<()> {
        self.call_empty(ApiRequest::post("api/token/invalidate/").body(json!({})))
            .await
    }

    // Users

    pub async fn create_user(&self, username: &str, password: &str) -> ClientResult<UserProfile> {
        let request = ApiRequest::post("api/users/")
            .anonymous()
            .json(&Credentials { username, password })?;
        self.call(request).await
    }

    pub async fn get_user(&self, id: i64) -> ClientResult<UserProfile> {
        self.call(ApiRequest::get(format!("api/users/{}/", id))).await
    }

    pub async fn update_user(&self, id: i64, update: &ProfileUpdate) -> ClientResult<UserProfile> {
        self.call(ApiRequest::patch(format!("api/users/{}/", id)).json(update)?)
            .await
    }

    pub async fn delete_user(&self, id: i64) -> ClientResult<()> {
        self.call_empty(ApiRequest::delete(format!("api/users/{}/", id)))
            .await
    }

    // Email and password links

    pub async fn verify_email(&self, link_token: &str) -> ClientResult<Value> {
        self.execute(
            ApiRequest::post("api/verify-email/")
                .bearer(link_token)
                .body(json!({})),
        )
        .await
    }

    pub async fn request_email_token(&self) -> ClientResult<Value> {
        self.execute(ApiRequest::post("api/verify-email/request-token/").body(json!({})))
            .await
    }

    pub async fn forget_password(&self, email: &str) -> ClientResult<Value> {
        self.execute(
            ApiRequest::post("api/password/forget/")
                .anonymous()
                .body(json!({ "email": email })),
        )
        .await
    }

    pub async fn reset_password(&self, link_token: &str, password: &str) -> ClientResult<Value> {
        self.execute(
            ApiRequest::post("api/password/reset/")
                .bearer(link_token)
                .body(json!({ "password": password })),
        )
        .await
    }

    // Courses

    /// Ask the backend to fetch (or refetch) a course from the registrar.
    pub async fn fetch_course(&self, term: &str, course: &str) -> ClientResult<CoursePayload> {
        let request = ApiRequest::put(format!("api/courses/{}/{}/", term, course))
            .body(json!({}))
            .timeout(self.inner.course_timeout);
        self.call(request).await
    }

    pub async fn get_course(&self, term: &str, course: &str) -> ClientResult<CoursePayload> {
        self.call(ApiRequest::get(format!("api/courses/{}/{}/", term, course)))
            .await
    }

    // Tasks

    pub async fn create_task(&self, task: &NewTask<'_>) -> ClientResult<Task> {
        self.call(ApiRequest::post("api/tasks/").json(task)?).await
    }

    pub async fn list_tasks(&self, page: u32) -> ClientResult<Page<Task>> {
        self.call(ApiRequest::get("api/tasks/").query("page", page))
            .await
    }

    pub async fn get_task(&self, id: i64) -> ClientResult<Task> {
        self.call(ApiRequest::get(format!("api/tasks/{}/", id))).await
    }

    pub async fn update_task(&self, id: i64, update: &ItemUpdate) -> ClientResult<Task> {
        self.call(ApiRequest::patch(format!("api/tasks/{}/", id)).json(update)?)
            .await
    }

    pub async fn delete_task(&self, id: i64) -> ClientResult<()> {
        self.call_empty(ApiRequest::delete(format!("api/tasks/{}/", id)))
            .await
    }

    // Schedules

    pub async fn list_schedules(&self, filter: ScheduleFilter) -> ClientResult<Page<Schedule>> {
        let mut request = ApiRequest::get("api/schedules/").query("page", filter.page);
        if filter.saved_only {
            request = request.query("saved", true);
        }
        if filter.public_only {
            request = request.query("public", true);
        }
        self.call(request).await
    }

    pub async fn get_schedule(&self, id: i64) -> ClientResult<Schedule> {
        self.call(ApiRequest::get(format!("api/schedules/{}/", id)))
            .await
    }

    pub async fn update_schedule(&self, id: i64, update: &ItemUpdate) -> ClientResult<Schedule> {
        self.call(ApiRequest::patch(format!("api/schedules/{}/", id)).json(update)?)
            .await
    }

    pub async fn delete_schedule(&self, id: i64) -> ClientResult<()> {
        self.call_empty(ApiRequest::delete(format!("api/schedules/{}/", id)))
            .await
    }

    // Saved task data

    pub async fn get_task_data(&self, id: i64) -> ClientResult<TaskData> {
        self.call(ApiRequest::get(format!("api/task-data/{}/", id)))
            .await
    }

    pub async fn update_task_data(
        &self,
        id: i64,
        update: &TaskDataUpdate<'_>,
    ) -> ClientResult<TaskData> {
        self.call(ApiRequest::patch(format!("api/task-data/{}/", id)).json(update)?)
            .await
    }
}

/// Token endpoints are called without a session token and never intercepted.
#[async_trait]
impl TokenEndpoints for SchedulerClient {
    async fn verify_token(&self, token: &str) -> ClientResult<()> {
        let request = ApiRequest::post("api/token/verify/")
            .anonymous()
            .body(json!({ "token": token }));
        into_result(self.send_once(&request, None).await?).map(|_| ())
    }

    async fn refresh_token(&self, refresh: &str) -> ClientResult<TokenPatch> {
        let request = ApiRequest::post("api/token/refresh/")
            .anonymous()
            .body(json!({ "refresh": refresh }));
        decode_value(into_result(self.send_once(&request, None).await?)?)
    }
}
