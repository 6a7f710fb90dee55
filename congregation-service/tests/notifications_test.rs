mod common;

use common::{TestApp, TestUser};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

/// Kinds of the user's notifications, newest first.
async fn kinds(app: &TestApp, user: &TestUser) -> Vec<String> {
    let (status, body) = app.get("/notifications", user).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]
        .as_array()
        .expect("notification list")
        .iter()
        .filter_map(|n| n["kind"].as_str().map(str::to_string))
        .collect()
}

async fn first_notification(app: &TestApp, user: &TestUser) -> Value {
    let (_, body) = app.get("/notifications", user).await;
    body["data"][0].clone()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn membership_decisions_notify_the_target() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let applicant = app.register().await;
    let declined = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "approval").await;

    assert_eq!(app.join(&applicant, congregation_id).await, "pending");
    assert_eq!(app.join(&declined, congregation_id).await, "pending");
    assert!(kinds(&app, &pastor)
        .await
        .iter()
        .all(|k| k == "join_requested"));
    assert_eq!(kinds(&app, &pastor).await.len(), 2);

    let members = format!("/congregations/{}/members", congregation_id);

    let applicant_row = app.membership_id(&pastor, congregation_id, &applicant).await;
    let (status, _) = app
        .post(&format!("{}/{}/approve", members, applicant_row), &pastor, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let declined_row = app.membership_id(&pastor, congregation_id, &declined).await;
    let (status, _) = app
        .post(&format!("{}/{}/reject", members, declined_row), &pastor, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kinds(&app, &declined).await, vec!["membership_rejected"]);

    let (status, _) = app
        .put(
            &format!("{}/{}/role", members, applicant_row),
            &pastor,
            json!({ "role": "deacon" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(&format!("{}/{}/remove", members, applicant_row), &pastor, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        kinds(&app, &applicant).await,
        vec!["membership_removed", "role_changed", "membership_approved"]
    );
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn only_the_owner_marks_a_notification_read() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let applicant = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "approval").await;
    app.join(&applicant, congregation_id).await;

    let notification = first_notification(&app, &pastor).await;
    assert_eq!(notification["kind"], "join_requested");
    let read_path = format!(
        "/notifications/{}/read",
        notification["notification_id"]
            .as_str()
            .expect("notification_id")
    );

    let (status, _) = app.post(&read_path, &applicant, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unread) = app.get("/notifications/unread-count", &pastor).await;
    assert_eq!(unread["data"]["unread"], 1);

    let (status, body) = app.post(&read_path, &pastor, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 1);

    let (_, unread) = app.get("/notifications/unread-count", &pastor).await;
    assert_eq!(unread["data"]["unread"], 0);

    let (_, unread_only) = app.get("/notifications?unread=true", &pastor).await;
    assert_eq!(unread_only["data"].as_array().map(Vec::len), Some(0));

    let (status, _) = app
        .post(
            &format!("/notifications/{}/read", Uuid::new_v4()),
            &pastor,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn mark_all_read_only_touches_own_notifications() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let first = app.register().await;
    let second = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "approval").await;
    app.join(&first, congregation_id).await;
    app.join(&second, congregation_id).await;

    let row = app.membership_id(&pastor, congregation_id, &first).await;
    app.post(
        &format!("/congregations/{}/members/{}/approve", congregation_id, row),
        &pastor,
        json!({}),
    )
    .await;

    let (status, body) = app.post("/notifications/read-all", &pastor, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 2);

    let (_, unread) = app.get("/notifications/unread-count", &first).await;
    assert_eq!(unread["data"]["unread"], 1);
}
