mod common;

use common::TestApp;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn private_congregation_admin_data_is_hidden_from_non_members() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let outsider = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "invite_only").await;

    for path in [
        format!("/congregations/{}", congregation_id),
        format!("/congregations/{}/roster", congregation_id),
        format!("/congregations/{}/requests", congregation_id),
        format!("/congregations/{}/members", congregation_id),
        format!("/congregations/{}/invites", congregation_id),
    ] {
        let (status, body) = app.get(&path, &outsider).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} leaked: {}", path, body);
    }

    let (_, directory) = app.get("/congregations?limit=100", &outsider).await;
    assert!(directory["data"]
        .as_array()
        .is_some_and(|rows| rows
            .iter()
            .all(|c| c["congregation_id"] != json!(congregation_id))));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn context_override_is_only_honoured_for_super_admins() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let other = app.register().await;
    let root = app.register_super_admin().await;

    let congregation_id = app.create_congregation(&pastor, "approval").await;
    let other_congregation = app.create_congregation(&other, "approval").await;

    let (_, context) = app
        .get(&format!("/context?congregation_id={}", congregation_id), &other)
        .await;
    assert_eq!(context["data"]["congregation"]["congregation_id"], json!(other_congregation));

    let (status, context) = app
        .get(&format!("/context?congregation_id={}", congregation_id), &root)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(context["data"]["access"], "super_admin");
    assert_eq!(context["data"]["congregation"]["congregation_id"], json!(congregation_id));
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn suspension_closes_a_congregation_to_its_members() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let root = app.register_super_admin().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/congregations/{}/suspend", congregation_id),
            Some(&pastor.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/congregations/{}/suspend", congregation_id),
            Some(&root.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/posts", &pastor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/congregations/{}/reactivate", congregation_id),
            Some(&root.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/posts", &pastor).await;
    assert_eq!(status, StatusCode::OK);
}
