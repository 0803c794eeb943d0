//! Request description used by [`SchedulerClient`](super::SchedulerClient).

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::transport::Method;

/// Which bearer token, if any, a request carries.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// The signed-in user's access token, refreshed on expiry
    Session,
    /// No token at all
    Anonymous,
    /// A one-off token from an emailed link
    Token(String),
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Session => f.write_str("Session"),
            AuthMode::Anonymous => f.write_str("Anonymous"),
            AuthMode::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `api/tasks/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub auth: AuthMode,
    /// Overrides the client's default timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            auth: AuthMode::Session,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Validation(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = AuthMode::Anonymous;
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMode::Token(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let request = ApiRequest::get("api/schedules/")
            .query("page", 2)
            .query("saved", true)
            .timeout(Duration::from_secs(1));
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.auth, AuthMode::Session);
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("saved".to_string(), "true".to_string())
            ]
        );

        let request = ApiRequest::post("api/token/")
            .anonymous()
            .json(&json!({"username": "u"}))
            .unwrap();
        assert_eq!(request.auth, AuthMode::Anonymous);
        assert_eq!(request.body, Some(json!({"username": "u"})));
    }

    #[test]
    fn test_link_token_is_redacted() {
        let request = ApiRequest::post("api/password/reset/").bearer("link-secret");
        assert!(!format!("{:?}", request).contains("link-secret"));
    }
}
