//! User-facing error messages.
//!
//! An [`ErrorFormatter`] is an ordered list of formatters. Each one either
//! produces a message for an error or passes; the first message wins and
//! the error's own display text is the fallback.
//!
//! ```
//! use trojan_scheduler::api::format::ErrorFormatter;
//!
//! let formatter = ErrorFormatter::new()
//!     .match_status("Course not found", &[404])
//!     .no_permission("Please log in first")
//!     .response_data()
//!     .status_code();
//! # let _ = formatter;
//! ```

use serde_json::Value;

use crate::error::ClientError;

type FormatFn = Box<dyn Fn(&ClientError) -> Option<String> + Send + Sync>;

#[derive(Default)]
pub struct ErrorFormatter {
    formatters: Vec<FormatFn>,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a custom formatter.
    pub fn with<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&ClientError) -> Option<String> + Send + Sync + 'static,
    {
        self.formatters.push(Box::new(formatter));
        self
    }

    /// `message` for responses whose status is in `statuses`.
    pub fn match_status(self, message: impl Into<String>, statuses: &[u16]) -> Self {
        let message = message.into();
        let statuses = statuses.to_vec();
        self.with(move |err| {
            err.status()
                .filter(|s| statuses.contains(s))
                .map(|_| message.clone())
        })
    }

    /// `message` for responses whose status is not in `statuses`.
    pub fn exclude_status(self, message: impl Into<String>, statuses: &[u16]) -> Self {
        let message = message.into();
        let statuses = statuses.to_vec();
        self.with(move |err| {
            err.status()
                .filter(|s| !statuses.contains(s))
                .map(|_| message.clone())
        })
    }

    /// `message` for 401 and 403 responses.
    pub fn no_permission(self, message: impl Into<String>) -> Self {
        self.match_status(message, &[401, 403])
    }

    /// Field errors from the response body, one per line.
    pub fn response_data(self) -> Self {
        self.with(|err| {
            let data = &err.api()?.data;
            if !(data.is_object() || data.is_array()) {
                return None;
            }
            let lines = flatten_error_data(data);
            if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            }
        })
    }

    /// `"<status> <reason>"`, e.g. `404 Not Found`.
    pub fn status_code(self) -> Self {
        self.with(|err| {
            let api = err.api()?;
            if api.status_text.is_empty() {
                None
            } else {
                Some(format!("{} {}", api.status, api.status_text))
            }
        })
    }

    pub fn format(&self, err: &ClientError) -> String {
        self.formatters
            .iter()
            .find_map(|f| f(err))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| err.to_string())
    }
}

/// The formatter used when a caller has nothing more specific to say.
pub fn default_formatter() -> ErrorFormatter {
    ErrorFormatter::new().response_data().status_code()
}

/// Prefix for a field error, e.g. `Start time: `.
pub fn format_key(key: Option<&str>) -> String {
    let key = match key {
        None | Some("detail") | Some("description") => return String::new(),
        Some(key) => key,
    };
    let spaced = key
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => format!("{}{}: ", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_into(data: &Value, parent_key: Option<&str>, out: &mut Vec<String>) {
    match data {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Object(_) | Value::Array(_) => flatten_into(value, Some(key), out),
                    Value::Null => {}
                    scalar => out.push(format!("{}{}", format_key(Some(key)), scalar_text(scalar))),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(_) | Value::Array(_) => flatten_into(item, parent_key, out),
                    Value::Null => {}
                    scalar => out.push(format!("{}{}", format_key(parent_key), scalar_text(scalar))),
                }
            }
        }
        Value::Null => {}
        scalar => out.push(scalar_text(scalar)),
    }
}

/// Flatten a DRF-style error body into readable lines.
///
/// Nested objects and arrays are walked depth first, keys in the order the
/// backend sent them. Array items take the key of the array that holds them.
pub fn flatten_error_data(data: &Value) -> Vec<String> {
    let mut out = Vec::new();
    flatten_into(data, None, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;

    fn api(status: u16, text: &str, data: Value) -> ClientError {
        ClientError::Api(ApiError::new(status, text, data))
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(None), "");
        assert_eq!(format_key(Some("detail")), "");
        assert_eq!(format_key(Some("description")), "");
        assert_eq!(format_key(Some("username")), "Username: ");
        assert_eq!(format_key(Some("non_field__errors")), "Non field errors: ");
    }

    #[test]
    fn test_flatten_nested() {
        let data = json!({
            "detail": "Bad input.",
            "password": ["This password is too short.", "This password is too common."],
            "preference": {"early_time": ["Enter a valid time."]},
            "count": 3,
            "ignored": null
        });
        assert_eq!(
            flatten_error_data(&data),
            vec![
                "Bad input.",
                "Password: This password is too short.",
                "Password: This password is too common.",
                "Early time: Enter a valid time.",
                "Count: 3",
            ]
        );
    }

    #[test]
    fn test_first_match_wins() {
        let formatter = ErrorFormatter::new()
            .match_status("Course not found", &[404])
            .no_permission("Please log in")
            .response_data()
            .status_code();

        assert_eq!(
            formatter.format(&api(404, "Not Found", json!({"detail": "x"}))),
            "Course not found"
        );
        assert_eq!(
            formatter.format(&api(403, "Forbidden", Value::Null)),
            "Please log in"
        );
        assert_eq!(
            formatter.format(&api(400, "Bad Request", json!({"term": ["Invalid term."]}))),
            "Term: Invalid term."
        );
        assert_eq!(
            formatter.format(&api(500, "Internal Server Error", Value::Null)),
            "500 Internal Server Error"
        );
    }

    #[test]
    fn test_non_api_errors_fall_back_to_display() {
        let formatter = ErrorFormatter::new()
            .exclude_status("Something went wrong", &[400])
            .status_code();
        let err = ClientError::Timeout("no response after 5s".into());
        assert_eq!(formatter.format(&err), err.to_string());

        assert_eq!(
            formatter.format(&api(502, "Bad Gateway", Value::Null)),
            "Something went wrong"
        );
        assert_eq!(
            formatter.format(&api(400, "Bad Request", Value::Null)),
            "400 Bad Request"
        );
    }

    #[test]
    fn test_empty_body_falls_through() {
        let formatter = default_formatter();
        assert_eq!(
            formatter.format(&api(400, "Bad Request", json!({}))),
            "400 Bad Request"
        );
    }
}
