//! In-memory transport with scripted responses.
//!
//! Routes are matched on method and URL path, in registration order.
//! One-shot routes are consumed when they answer, so a sequence of
//! responses for the same endpoint can be scripted:
//!
//! ```ignore
//! let transport = LocalTransport::new();
//! transport
//!     .once_json(Method::Get, "/api/tasks/1/", 200, json!({"id": 1, "status": "PD"}))
//!     .on_json(Method::Get, "/api/tasks/1/", 200, json!({"id": 1, "status": "DN"}));
//! ```
//!
//! Every request is recorded and can be inspected afterwards.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use super::{HttpRequest, HttpResponse, Method, Transport, TransportError};

type Handler = Box<dyn FnMut(&HttpRequest) -> Result<HttpResponse, TransportError> + Send>;

struct Route {
    method: Method,
    path: String,
    handler: Handler,
    /// `None` for routes that answer forever
    remaining: Option<usize>,
}

#[derive(Default)]
struct LocalData {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
    latency: Option<Duration>,
}

/// Scripted transport for tests and offline runs.
#[derive(Clone, Default)]
pub struct LocalTransport {
    data: Arc<Mutex<LocalData>>,
}

/// Path component of a request URL.
pub fn request_path(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}

/// Query parameters of a request URL, in order.
pub fn request_query(url: &str) -> Vec<(String, String)> {
    reqwest::Url::parse(url)
        .map(|u| {
            u.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, e.g. to exercise cancellation.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.data.lock().latency = Some(latency);
        self
    }

    fn push(&self, method: Method, path: &str, handler: Handler, remaining: Option<usize>) -> &Self {
        self.data.lock().routes.push(Route {
            method,
            path: path.to_string(),
            handler,
            remaining,
        });
        self
    }

    /// Answer matching requests with `handler` until the transport is dropped.
    pub fn on<F>(&self, method: Method, path: &str, handler: F) -> &Self
    where
        F: FnMut(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + 'static,
    {
        self.push(method, path, Box::new(handler), None)
    }

    /// Always answer matching requests with `status` and `body`.
    pub fn on_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.on(method, path, move |_| Ok(HttpResponse::new(status, body.clone())))
    }

    /// Answer the next matching request with `status` and `body`.
    pub fn once_json(&self, method: Method, path: &str, status: u16, body: Value) -> &Self {
        self.push(
            method,
            path,
            Box::new(move |_: &HttpRequest| {
                Ok(HttpResponse::new(status, body.clone()))
            }),
            Some(1),
        )
    }

    /// Fail the next matching request without a response.
    pub fn once_error(&self, method: Method, path: &str, error: TransportError) -> &Self {
        self.push(method, path, Box::new(move |_: &HttpRequest| Err(error.clone())), Some(1))
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.data.lock().requests.clone()
    }

    /// Requests received for one endpoint.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<HttpRequest> {
        self.data
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && request_path(&r.url) == path)
            .cloned()
            .collect()
    }

    fn answer(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request_path(&request.url);
        let mut data = self.data.lock();
        let route = data.routes.iter_mut().find(|r| {
            r.method == request.method && r.path == path && r.remaining != Some(0)
        });
        match route {
            Some(route) => {
                if let Some(n) = route.remaining.as_mut() {
                    *n -= 1;
                }
                (route.handler)(request)
            }
            None => {
                log::debug!("No local route for {} {}", request.method, path);
                Ok(HttpResponse::new(404, json!({"detail": "Not found."})))
            }
        }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let latency = {
            let mut data = self.data.lock();
            data.requests.push(request.clone());
            data.latency
        };
        if let Some(latency) = latency {
            if latency > request.timeout {
                tokio::time::sleep(request.timeout).await;
                return Err(TransportError::Timeout(request.timeout));
            }
            tokio::time::sleep(latency).await;
        }
        self.answer(&request)
    }
}
