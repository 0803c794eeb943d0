#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use trojan_scheduler::models::TokenPatch;
use trojan_scheduler::{Action, ClientConfig, LocalTransport, SchedulerClient, Store, StoreHandle};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Access to the process environment is serialized and the previous values
/// are restored on unwind. `None` removes a variable.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }
        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in &self.snapshot {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }
    }
}

/// Unsigned JWT carrying `exp` and `user_id`.
pub fn make_token(exp: i64, user_id: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({"token_type": "access", "exp": exp, "user_id": user_id});
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

pub fn fresh_token(user_id: i64) -> String {
    make_token(chrono::Utc::now().timestamp() + 3600, user_id)
}

pub fn expired_token(user_id: i64) -> String {
    make_token(chrono::Utc::now().timestamp() - 60, user_id)
}

pub fn signed_in_store(access: &str, refresh: &str) -> StoreHandle {
    let store = StoreHandle::new(Store::default());
    store.dispatch(Action::SetUserTokens(TokenPatch {
        access: Some(access.to_string()),
        refresh: Some(refresh.to_string()),
    }));
    store
}

pub fn client(transport: &LocalTransport, store: StoreHandle) -> SchedulerClient {
    SchedulerClient::new(&ClientConfig::default(), Arc::new(transport.clone()), store)
}

/// Course payload with a lecture, a closed lecture and a lab.
pub fn course_json(name: &str, updated: &str) -> Value {
    json!({
        "name": name,
        "term": "20203",
        "updated": updated,
        "sections": [
            {"section_id": 30001, "section_type": "Lecture", "days": "MW", "start": "10:00", "end": "11:50"},
            {"section_id": 30002, "section_type": "Lecture", "days": "TTh", "start": "14:00", "end": "15:50", "closed": true},
            {"section_id": 30010, "section_type": "Lab", "days": "F", "start": "09:00", "end": "10:50"}
        ]
    })
}

pub fn task_json(id: i64, status: &str) -> Value {
    json!({"id": id, "status": status, "created": "2020-08-01T12:00:00Z"})
}

pub fn profile_json(id: i64, saved_task_data: Option<i64>) -> Value {
    json!({
        "id": id,
        "username": "tommy",
        "email": "tommy@usc.edu",
        "display_name": "Tommy Trojan",
        "saved_task_data": saved_task_data
    })
}
