mod support;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use trojan_scheduler::coursebin::transform_course;
use trojan_scheduler::models::{CoursePayload, Preferences, TaskStatus};
use trojan_scheduler::services::tasks::{self, PollConfig, PollOutcome, POLL_EXHAUSTED_MESSAGE};
use trojan_scheduler::services::{account, coursebin};
use trojan_scheduler::transport::Method;
use trojan_scheduler::{Action, ClientError, LocalTransport, Store, StoreHandle};

use support::{client, course_json, fresh_token, profile_json, signed_in_store, task_json};

const QUICK: PollConfig = PollConfig {
    retries: 2,
    initial_delay: Duration::from_millis(1),
};

fn with_courses(store: &StoreHandle, names: &[&str]) {
    for name in names {
        let payload: CoursePayload =
            serde_json::from_value(course_json(name, "2020-08-01T12:00:00Z")).unwrap();
        store.dispatch(Action::AddCourse(payload));
    }
}

// Account

#[tokio::test]
async fn test_login_stores_tokens_and_profile() {
    let access = fresh_token(7);
    let transport = LocalTransport::new();
    transport
        .on_json(
            Method::Post,
            "/api/token/",
            200,
            json!({"access": access, "refresh": "refresh-1"}),
        )
        .on_json(Method::Get, "/api/users/7/", 200, profile_json(7, Some(11)));
    let client = client(&transport, StoreHandle::default());

    let profile = account::login(&client, "tommy", "fight-on").await.unwrap();
    assert_eq!(profile.name(), "Tommy Trojan");

    let state = client.store().get();
    assert_eq!(state.user.tokens.access, Some(access));
    assert_eq!(state.user.tokens.refresh.as_deref(), Some("refresh-1"));
    assert_eq!(state.user.profile.and_then(|p| p.saved_task_data), Some(11));

    let sent = transport.requests_to(Method::Post, "/api/token/");
    assert_eq!(sent[0].bearer, None);
    assert_eq!(
        sent[0].body,
        Some(json!({"username": "tommy", "password": "fight-on"}))
    );
}

#[tokio::test]
async fn test_failed_login_clears_previous_session() {
    let transport = LocalTransport::new();
    transport.on_json(
        Method::Post,
        "/api/token/",
        401,
        json!({"detail": "No active account found with the given credentials"}),
    );
    let client = client(&transport, signed_in_store(&fresh_token(3), "refresh-1"));

    let err = account::login(&client, "tommy", "wrong").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!client.store().read(|s| s.user.is_logged_in()));
}

#[tokio::test]
async fn test_profile_failure_keeps_tokens() {
    let transport = LocalTransport::new();
    transport
        .on_json(
            Method::Post,
            "/api/token/",
            200,
            json!({"access": fresh_token(7), "refresh": "refresh-1"}),
        )
        .on_json(Method::Get, "/api/users/7/", 500, Value::Null);
    let client = client(&transport, StoreHandle::default());

    assert!(account::login(&client, "tommy", "fight-on").await.is_err());
    let state = client.store().get();
    assert!(state.user.is_logged_in());
    assert!(state.user.profile.is_none());
}

#[tokio::test]
async fn test_signup_then_login() {
    let transport = LocalTransport::new();
    transport
        .on_json(Method::Post, "/api/users/", 201, profile_json(8, None))
        .on_json(
            Method::Post,
            "/api/token/",
            200,
            json!({"access": fresh_token(8), "refresh": "r"}),
        )
        .on_json(Method::Get, "/api/users/8/", 200, profile_json(8, None));
    let client = client(&transport, StoreHandle::default());

    let profile = account::signup(&client, "tommy", "fight-on").await.unwrap();
    assert_eq!(profile.id, 8);
    assert_eq!(transport.requests_to(Method::Post, "/api/users/")[0].bearer, None);
}

#[tokio::test]
async fn test_logout_clears_state_even_if_server_fails() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Post, "/api/token/invalidate/", 500, Value::Null);
    let client = client(&transport, signed_in_store(&fresh_token(7), "refresh-1"));

    account::logout(&client).await;
    assert!(!client.store().read(|s| s.user.is_logged_in()));
    assert_eq!(
        transport.requests_to(Method::Post, "/api/token/invalidate/").len(),
        1
    );
}

#[tokio::test]
async fn test_reset_password_checks_confirmation_locally() {
    let transport = LocalTransport::new();
    let client = client(&transport, StoreHandle::default());

    let err = account::reset_password(&client, "link", "hunter22", "hunter23")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(transport.requests().is_empty());
}

// Coursebin

#[tokio::test]
async fn test_fetch_course_adds_to_coursebin() {
    let transport = LocalTransport::new();
    transport.on_json(
        Method::Put,
        "/api/courses/20203/csci-356/",
        200,
        course_json("csci-356", "2020-08-01T12:00:00Z"),
    );
    let client = client(&transport, StoreHandle::default());

    coursebin::fetch_course(&client, "20203", " csci-356 ").await.unwrap();
    let sent = transport.requests();
    assert_eq!(sent[0].body, Some(json!({})));
    assert_eq!(sent[0].timeout, Duration::from_secs(15));

    let course = client.store().read(|s| s.course.clone());
    assert_eq!(course.len(), 7);
    assert_eq!(course[0].node_id(), "csci-356");
}

#[tokio::test]
async fn test_refresh_stale_collects_failures() {
    let transport = LocalTransport::new();
    transport
        .on_json(
            Method::Put,
            "/api/courses/20203/csci-356/",
            200,
            course_json("csci-356", "2020-08-01T13:00:00Z"),
        )
        .on_json(
            Method::Put,
            "/api/courses/20203/math-225/",
            503,
            json!({"detail": "Registrar unavailable"}),
        );
    let store = StoreHandle::default();
    with_courses(&store, &["csci-356", "math-225"]);
    let client = client(&transport, store);

    let now: DateTime<Utc> = "2020-08-01T13:00:00Z".parse().unwrap();
    let report = coursebin::refresh_stale(&client, chrono::Duration::minutes(10), now).await;

    assert_eq!(report.refreshed, vec!["csci-356".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "math-225");
    assert_eq!(report.failed[0].1.status(), Some(503));

    let updated = client.store().read(|s| {
        s.course
            .iter()
            .filter_map(|n| n.as_course())
            .map(|c| (c.course.clone(), c.updated))
            .collect::<Vec<_>>()
    });
    assert!(updated.contains(&("csci-356".to_string(), now)));
}

#[tokio::test]
async fn test_save_task_data_requires_profile() {
    let transport = LocalTransport::new();
    let client = client(&transport, signed_in_store(&fresh_token(7), "r"));

    let err = coursebin::save_task_data(&client).await.unwrap_err();
    assert!(matches!(err, ClientError::NotLoggedIn));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_save_task_data_uploads_everything() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Patch, "/api/task-data/11/", 200, json!({"id": 11}));
    let store = signed_in_store(&fresh_token(7), "r");
    store.dispatch(Action::SetUserProfile(Some(
        serde_json::from_value(profile_json(7, Some(11))).unwrap(),
    )));
    with_courses(&store, &["csci-356"]);
    let client = client(&transport, store);

    coursebin::save_task_data(&client).await.unwrap();
    let body = transport.requests()[0].body.clone().unwrap();
    assert_eq!(body["coursebin"].as_array().map(Vec::len), Some(7));
    assert_eq!(body["preference"]["early_weight"], json!(75));
    assert_eq!(body["setting"]["term"], json!("20203"));
}

#[tokio::test]
async fn test_load_request_data_replaces_inputs() {
    let payload: CoursePayload =
        serde_json::from_value(course_json("ee-109", "2020-08-01T12:00:00Z")).unwrap();
    let preference = Preferences {
        early_weight: 10,
        ..Preferences::default()
    };
    let transport = LocalTransport::new();
    transport.on_json(
        Method::Get,
        "/api/task-data/21/",
        200,
        json!({
            "id": 21,
            "coursebin": transform_course(&payload),
            "preference": preference,
            "setting": {"excludeClosed": true}
        }),
    );
    let store = StoreHandle::default();
    with_courses(&store, &["csci-356"]);
    let client = client(&transport, store);

    coursebin::load_request_data(&client, 21).await.unwrap();
    let state = client.store().get();
    assert_eq!(state.course[0].node_id(), "ee-109");
    assert_eq!(state.preference.early_weight, 10);
    assert!(state.setting.exclude_closed);
    assert_eq!(state.setting.term, "20203");
}

#[tokio::test]
async fn test_load_inputs_follow_request_data() {
    let payload: CoursePayload =
        serde_json::from_value(course_json("ee-109", "2020-08-01T12:00:00Z")).unwrap();
    let transport = LocalTransport::new();
    transport
        .on_json(
            Method::Get,
            "/api/tasks/5/",
            200,
            json!({"id": 5, "status": "DN", "request_data": 21}),
        )
        .on_json(
            Method::Get,
            "/api/schedules/8/",
            200,
            json!({"id": 8, "request_data": 21}),
        )
        .on_json(
            Method::Get,
            "/api/task-data/21/",
            200,
            json!({"id": 21, "coursebin": transform_course(&payload)}),
        );
    let store = StoreHandle::default();
    with_courses(&store, &["csci-356"]);
    let client = client(&transport, store);

    assert_eq!(coursebin::load_task_inputs(&client, 5).await.unwrap(), 21);
    assert_eq!(client.store().get().course[0].node_id(), "ee-109");

    with_courses(client.store(), &["csci-356"]);
    assert_eq!(coursebin::load_schedule_inputs(&client, 8).await.unwrap(), 21);
    assert_eq!(transport.requests_to(Method::Get, "/api/task-data/21/").len(), 2);
    assert!(transport.requests_to(Method::Get, "/api/task-data/5/").is_empty());
}

#[tokio::test]
async fn test_load_inputs_without_request_data() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Get, "/api/tasks/5/", 200, task_json(5, "FL"));
    let client = client(&transport, StoreHandle::default());

    let err = coursebin::load_task_inputs(&client, 5).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(transport.requests().len(), 1);
}

// Tasks

#[tokio::test]
async fn test_submit_polls_until_done() {
    let transport = LocalTransport::new();
    transport
        .on_json(Method::Post, "/api/tasks/", 201, task_json(3, "PD"))
        .once_json(Method::Get, "/api/tasks/3/", 200, task_json(3, "PS"))
        .on_json(
            Method::Get,
            "/api/tasks/3/",
            200,
            json!({"id": 3, "status": "DN", "count": 40, "schedules": [{"id": 9}, {"id": 4}]}),
        );
    let store = StoreHandle::default();
    with_courses(&store, &["csci-356", "math-225"]);
    store.dispatch(Action::ToggleCourseInclude("math-225".into()));
    let client = client(&transport, store);

    let outcome = tasks::submit_with(&client, Some("Fall"), QUICK).await.unwrap();
    match &outcome {
        PollOutcome::Finished(task) => assert_eq!(task.status, TaskStatus::Done),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        outcome.message(),
        "Done! We found 40 valid schedules and we picked the top 2 for you."
    );

    let body = transport.requests_to(Method::Post, "/api/tasks/")[0]
        .body
        .clone()
        .unwrap();
    assert_eq!(body["name"], json!("Fall"));
    assert_eq!(body["description"], json!("CSCI-356"));
    assert_eq!(body["coursebin"].as_array().map(Vec::len), Some(14));
    assert_eq!(transport.requests_to(Method::Get, "/api/tasks/3/").len(), 2);

    let stored = client.store().read(|s| s.task_result.clone()).unwrap();
    assert_eq!(stored.status, TaskStatus::Done);
}

#[tokio::test]
async fn test_submit_rejects_empty_coursebin() {
    let transport = LocalTransport::new();
    let client = client(&transport, StoreHandle::default());

    let err = tasks::submit(&client, None).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_poll_gives_up_after_retries() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Get, "/api/tasks/5/", 200, task_json(5, "PS"));
    let client = client(&transport, StoreHandle::default());

    let outcome = tasks::poll(&client, 5, QUICK).await.unwrap();
    assert!(matches!(outcome, PollOutcome::Exhausted(_)));
    assert_eq!(outcome.message(), POLL_EXHAUSTED_MESSAGE);
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(
        client.store().read(|s| s.task_result.as_ref().map(|t| t.id)),
        Some(5)
    );
}

#[tokio::test]
async fn test_resume_only_when_in_progress() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Get, "/api/tasks/6/", 200, task_json(6, "DN"));
    let store = StoreHandle::new(Store::default());
    let client = client(&transport, store.clone());

    assert!(tasks::resume_with(&client, QUICK).await.unwrap().is_none());

    store.dispatch(Action::SaveTaskResult(Some(
        serde_json::from_value(task_json(6, "PD")).unwrap(),
    )));
    let outcome = tasks::resume_with(&client, QUICK).await.unwrap().unwrap();
    assert_eq!(outcome.task().status, TaskStatus::Done);

    assert!(tasks::resume_with(&client, QUICK).await.unwrap().is_none());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let transport = LocalTransport::new();
    transport.on_json(Method::Get, "/api/tasks/8/", 200, task_json(8, "PD"));
    let token = CancellationToken::new();
    let client = client(&transport, StoreHandle::default()).with_cancel_token(token.clone());

    let slow = PollConfig {
        retries: 3,
        initial_delay: Duration::from_secs(30),
    };
    let handle = tokio::spawn(async move { tasks::poll(&client, 8, slow).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poll did not stop after cancellation")
        .unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert_eq!(transport.requests().len(), 1);
}
