mod common;

use common::TestApp;
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn invite_grants_its_role_into_invite_only_congregation() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let guest = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "invite_only").await;

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/congregations/{}/join", congregation_id),
            Some(&guest.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = app
        .create_invite(&pastor, congregation_id, json!({ "role": "deacon" }))
        .await;

    let (status, preview) = app
        .request(Method::GET, &format!("/invites/{}", token), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["data"]["valid"], true);
    assert_eq!(preview["data"]["role"], "deacon");

    let redeem = format!("/invites/{}/redeem", token);
    let (status, body) = app
        .request(Method::POST, &redeem, Some(&guest.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["membership"]["status"], "active");
    assert_eq!(body["data"]["membership"]["role"], "deacon");
    assert_eq!(body["data"]["already_member"], false);

    // Redeeming again as an active member is a no-op.
    let (status, body) = app
        .request(Method::POST, &redeem, Some(&guest.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["already_member"], true);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn invite_is_never_redeemed_past_max_uses() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "invite_only").await;
    let token = app
        .create_invite(&pastor, congregation_id, json!({ "max_uses": 2 }))
        .await;
    let redeem = format!("/invites/{}/redeem", token);

    let mut users = Vec::new();
    for _ in 0..4 {
        users.push(app.register().await);
    }

    let results = redeem_concurrently(&app, &redeem, &users).await;
    let accepted = results.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(accepted, 2, "statuses: {:?}", results);
    assert!(results
        .iter()
        .filter(|s| **s != StatusCode::OK)
        .all(|s| *s == StatusCode::BAD_REQUEST));

    let (_, invites) = app
        .get(&format!("/congregations/{}/invites", congregation_id), &pastor)
        .await;
    assert_eq!(invites["data"][0]["use_count"], 2);
}

/// Fire the redemptions concurrently.
async fn redeem_concurrently(
    app: &TestApp,
    path: &str,
    users: &[common::TestUser],
) -> Vec<StatusCode> {
    let mut handles = Vec::new();
    for user in users {
        let client = app.client.clone();
        let url = format!("{}{}", app.address, path);
        let token = user.token.clone();
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .send()
                .await
                .map(|r| r.status())
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        let status = handle
            .await
            .expect("task panicked")
            .expect("request failed");
        statuses.push(status);
    }
    statuses
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn revoked_and_expired_invites_are_rejected() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let guest = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "invite_only").await;

    let token = app.create_invite(&pastor, congregation_id, json!({})).await;
    let (_, invites) = app
        .get(&format!("/congregations/{}/invites", congregation_id), &pastor)
        .await;
    let invite_id = invites["data"][0]["invite_id"]
        .as_str()
        .expect("invite_id")
        .to_string();

    let (status, _) = app
        .delete(
            &format!("/congregations/{}/invites/{}", congregation_id, invite_id),
            &pastor,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/invites/{}/redeem", token),
            Some(&guest.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    // Force an expiry in the past.
    let token = app
        .create_invite(&pastor, congregation_id, json!({ "expires_in_hours": 1 }))
        .await;
    sqlx::query(
        "UPDATE congregation_invites SET expires_utc = now() - interval '1 minute' \
         WHERE congregation_id = $1 AND revoked_utc IS NULL",
    )
    .bind(congregation_id)
    .execute(app.pool())
    .await
    .expect("expire invite");

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/invites/{}/redeem", token),
            Some(&guest.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, preview) = app
        .request(Method::GET, &format!("/invites/{}", token), None, None)
        .await;
    assert_eq!(preview["data"]["valid"], false);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn admins_cannot_invite_above_their_rank() {
    let app = TestApp::spawn().await;
    let pastor = app.register().await;
    let congregation_id = app.create_congregation(&pastor, "open").await;

    let (status, _) = app
        .post(
            &format!("/congregations/{}/invites", congregation_id),
            &pastor,
            json!({ "role": "pastor" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            &format!("/congregations/{}/invites", congregation_id),
            &pastor,
            json!({ "max_uses": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["max_uses"].is_array());
}
