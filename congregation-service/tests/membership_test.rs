mod common;

use common::{TestApp, TestUser};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

async fn post_empty(app: &TestApp, path: &str, user: &TestUser) -> (StatusCode, Value) {
    app.request(Method::POST, path, Some(&user.token), None).await
}

fn primary_count(me: &Value) -> usize {
    me["data"]["memberships"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter(|m| m["is_primary"] == true && m["status"] == "active")
                .count()
        })
        .unwrap_or(0)
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn creator_becomes_primary_pastor() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;

    let (status, me) = app.get("/auth/me", &pastor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["primary_congregation_id"], json!(congregation_id));

    let (_, context) = app.get("/context", &pastor).await;
    assert_eq!(context["data"]["access"], "admin");
    assert_eq!(context["data"]["membership"]["role"], "pastor");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn open_join_activates_immediately() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let member = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;

    let (status, body) =
        post_empty(&app, &format!("/congregations/{}/join", congregation_id), &member).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "active");

    let (status, _) =
        post_empty(&app, &format!("/congregations/{}/join", congregation_id), &member).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn pending_member_cannot_act_until_approved() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let applicant = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "approval").await;

    let (status, body) = post_empty(
        &app,
        &format!("/congregations/{}/join", congregation_id),
        &applicant,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");

    // A repeated request leaves the pending row alone.
    let (status, body) = post_empty(
        &app,
        &format!("/congregations/{}/join", congregation_id),
        &applicant,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");

    let roster = format!("/congregations/{}/roster", congregation_id);
    let (status, _) = app.get(&roster, &applicant).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, pending) = app
        .get(&format!("/congregations/{}/requests", congregation_id), &pastor)
        .await;
    assert_eq!(pending["data"].as_array().map(Vec::len), Some(1));

    let (_, notifications) = app.get("/notifications?unread=true", &pastor).await;
    assert!(notifications["data"]
        .as_array()
        .is_some_and(|rows| rows.iter().any(|n| n["kind"] == "join_requested")));

    let membership_id = app.membership_id(&pastor, congregation_id, &applicant).await;
    let (status, body) = post_empty(
        &app,
        &format!(
            "/congregations/{}/members/{}/approve",
            congregation_id, membership_id
        ),
        &pastor,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "active");

    let (status, _) = app.get(&roster, &applicant).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn banned_users_cannot_rejoin() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let member = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;
    let join = format!("/congregations/{}/join", congregation_id);

    post_empty(&app, &join, &member).await;
    let membership_id = app.membership_id(&pastor, congregation_id, &member).await;

    let (status, body) = post_empty(
        &app,
        &format!("/congregations/{}/members/{}/ban", congregation_id, membership_id),
        &pastor,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "banned");

    let (status, _) = post_empty(&app, &join, &member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    post_empty(
        &app,
        &format!("/congregations/{}/members/{}/unban", congregation_id, membership_id),
        &pastor,
    )
    .await;
    let (status, body) = post_empty(&app, &join, &member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn members_cannot_manage_their_pastor() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let member = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;
    post_empty(&app, &format!("/congregations/{}/join", congregation_id), &member).await;

    let (status, _) = app
        .get(&format!("/congregations/{}/members", congregation_id), &member)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let pastor_membership = app.membership_id(&pastor, congregation_id, &pastor).await;
    let (status, _) = app
        .put(
            &format!(
                "/congregations/{}/members/{}/role",
                congregation_id, pastor_membership
            ),
            &member,
            json!({ "role": "member" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn a_user_never_holds_two_primaries() {
    let app = TestApp::spawn().await;
    let first_pastor = app.register().await;
    let second_pastor = app.register().await;
    let member = app.register().await;

    let first = app.create_congregation(&first_pastor, "open").await;
    let second = app.create_congregation(&second_pastor, "open").await;

    post_empty(&app, &format!("/congregations/{}/join", first), &member).await;
    post_empty(&app, &format!("/congregations/{}/join", second), &member).await;

    let (_, me) = app.get("/auth/me", &member).await;
    assert_eq!(primary_count(&me), 1);
    assert_eq!(me["data"]["primary_congregation_id"], json!(first));

    let (status, _) =
        post_empty(&app, &format!("/congregations/{}/primary", second), &member).await;
    assert_eq!(status, StatusCode::OK);
    let (_, me) = app.get("/auth/me", &member).await;
    assert_eq!(primary_count(&me), 1);
    assert_eq!(me["data"]["primary_congregation_id"], json!(second));

    // Leaving the primary congregation promotes the remaining one.
    let (status, body) =
        post_empty(&app, &format!("/congregations/{}/leave", second), &member).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "left");

    let (_, me) = app.get("/auth/me", &member).await;
    assert_eq!(primary_count(&me), 1);
    assert_eq!(me["data"]["primary_congregation_id"], json!(first));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn pastor_role_can_be_handed_over() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let successor = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;
    post_empty(&app, &format!("/congregations/{}/join", congregation_id), &successor).await;

    let (status, _) =
        post_empty(&app, &format!("/congregations/{}/leave", congregation_id), &pastor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let membership_id = app.membership_id(&pastor, congregation_id, &successor).await;
    let (status, body) = app
        .post(
            &format!("/congregations/{}/pastor", congregation_id),
            &pastor,
            json!({ "membership_id": membership_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (_, members) = app
        .get(&format!("/congregations/{}/members", congregation_id), &successor)
        .await;
    let role_of = |user_id: Uuid| {
        members["data"]
            .as_array()
            .and_then(|rows| rows.iter().find(|m| m["user_id"] == json!(user_id)))
            .map(|m| m["role"].clone())
    };
    assert_eq!(role_of(successor.user_id), Some(json!("pastor")));
    assert_eq!(role_of(pastor.user_id), Some(json!("admin")));
}
