mod common;

use common::token_pair;
use common::TestApp;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/v1/register")
        .json(&json!({
            "email": "nicola@example.com",
            "password": "pass_word!"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["email"], "nicola@example.com");
    assert_eq!(body["data"]["is_admin"], false);
    assert!(body["data"]["id"].is_i64());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;

    let response = app
        .post("/v1/register")
        .json(&json!({
            "email": "nicola@example.com",
            "password": "another"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 400);
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already been taken"));
}

#[tokio::test]
async fn test_register_invalid_input() {
    let app = TestApp::spawn().await;

    for payload in [
        json!({ "email": "not-an-email", "password": "pass_word!" }),
        json!({ "email": "nicola@example.com", "password": "" }),
        json!({ "email": "nicola@example.com" }),
    ] {
        let response = app
            .post("/v1/register")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    let id = app.register("nicola@example.com", "pass_word!").await;

    let (access, refresh) = app.login("nicola@example.com", "pass_word!").await;

    let claims = app.codec.parse_access(&access).expect("Invalid access token");
    assert_eq!(claims.user_id, id);
    assert!(!claims.is_admin);
    assert!(app.codec.parse_refresh(&refresh).is_ok());
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;

    let wrong_password = app
        .post("/v1/login")
        .json(&json!({ "email": "nicola@example.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to execute request");
    let unknown_user = app
        .post("/v1/login")
        .json(&json!({ "email": "nobody@example.com", "password": "pass_word!" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let first: Value = wrong_password.json().await.unwrap();
    let second: Value = unknown_user.json().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_login_invalid_input() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;

    for payload in [
        json!({ "email": "not-an-email", "password": "pass_word!" }),
        json!({ "email": "", "password": "pass_word!" }),
        json!({ "email": "nicola@example.com", "password": "" }),
        json!({ "password": "pass_word!" }),
    ] {
        let response = app
            .post("/v1/login")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_refresh_rotates_once() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;
    let (_, refresh) = app.login("nicola@example.com", "pass_word!").await;

    let first = app
        .post_authenticated("/v1/refresh", &refresh)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(first.status(), StatusCode::OK);
    let (_, rotated) = token_pair(first.json().await.unwrap());
    assert_ne!(rotated, refresh);

    let replay = app
        .post_authenticated("/v1/refresh", &refresh)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    let next = app
        .post_authenticated("/v1/refresh", &rotated)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_requires_refresh_token() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;
    let (access, _) = app.login("nicola@example.com", "pass_word!").await;

    let missing = app
        .post("/v1/refresh")
        .send()
        .await
        .expect("Failed to execute request");
    let wrong_type = app
        .post_authenticated("/v1/refresh", &access)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_type.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;
    let (_, refresh) = app.login("nicola@example.com", "pass_word!").await;

    let response = app
        .post("/v1/refresh")
        .header("Authorization", format!("bEaReR {}", refresh))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;
    let (_, refresh) = app.login("nicola@example.com", "pass_word!").await;

    for _ in 0..2 {
        let response = app
            .post_authenticated("/v1/revoke", &refresh)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .post_authenticated("/v1/refresh", &refresh)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_rejects_garbage() {
    let app = TestApp::spawn().await;

    let response = app
        .post_authenticated("/v1/revoke", "garbage")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_permissions_requires_token() {
    let app = TestApp::spawn().await;
    let id = app.register("nicola@example.com", "pass_word!").await;

    let response = app
        .put(&format!("/v1/users/{}/permissions", id))
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_permissions_rejects_refresh_token() {
    let app = TestApp::spawn().await;
    let id = app.register("nicola@example.com", "pass_word!").await;
    let (_, refresh) = app.login("nicola@example.com", "pass_word!").await;

    let response = app
        .put_authenticated(&format!("/v1/users/{}/permissions", id), &refresh)
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_permissions_forbidden_for_non_admin() {
    let app = TestApp::spawn().await;
    let id = app.register("nicola@example.com", "pass_word!").await;
    let (access, _) = app.login("nicola@example.com", "pass_word!").await;

    let response = app
        .put_authenticated(&format!("/v1/users/{}/permissions", id), &access)
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_permissions_as_admin() {
    let app = TestApp::spawn().await;
    let admin = app.admin_access_token().await;
    let id = app.register("nicola@example.com", "pass_word!").await;

    let response = app
        .put_authenticated(&format!("/v1/users/{}/permissions", id), &admin)
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (access, _) = app.login("nicola@example.com", "pass_word!").await;
    assert!(app.codec.parse_access(&access).unwrap().is_admin);
}

#[tokio::test]
async fn test_update_permissions_unknown_user() {
    let app = TestApp::spawn().await;
    let admin = app.admin_access_token().await;

    let response = app
        .put_authenticated("/v1/users/999/permissions", &admin)
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_permissions_invalid_id() {
    let app = TestApp::spawn().await;
    let admin = app.admin_access_token().await;

    let response = app
        .put_authenticated("/v1/users/abc/permissions", &admin)
        .json(&json!({ "is_admin": true }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_session_over_http() {
    let app = TestApp::spawn().await;
    app.register("nicola@example.com", "pass_word!").await;

    let (_, first) = app.login("nicola@example.com", "pass_word!").await;

    let response = app
        .post_authenticated("/v1/refresh", &first)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let (_, second) = token_pair(response.json().await.unwrap());

    let response = app
        .post_authenticated("/v1/revoke", &second)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for token in [&first, &second] {
        let response = app
            .post_authenticated("/v1/refresh", token)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
