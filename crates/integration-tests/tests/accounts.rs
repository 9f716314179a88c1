//! Registration, login, bearer tokens, profiles and password reset.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use chrono::{TimeDelta, Utc};
use serde_json::json;

use shoplist_integration_tests::{PASSWORD, TestApp, tokens};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, _) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_signup_then_login_resolves_same_user() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;

    let (status, body) = app.login("alice_1", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let again = body["token"].as_str().unwrap();

    let tokens = tokens();
    assert_eq!(
        tokens.verify(&token).unwrap().public_id,
        tokens.verify(again).unwrap().public_id
    );
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = TestApp::new();
    let cases = [
        (json!({"username": "alice", "email": "a@example.com", "password": PASSWORD}), "Username is too short!"),
        (json!({"username": "alice_1", "email": "not-an-email", "password": PASSWORD}), "E-mail is not valid!"),
        (json!({"username": "alice_1", "email": "a@example.com", "password": "short"}), "Password is too short!"),
    ];

    for (body, expected) in cases {
        let (status, response) = app.call(Method::POST, "/create-user", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], expected);
    }
}

#[tokio::test]
async fn test_create_user_duplicates_conflict() {
    let app = TestApp::new();
    app.signup("alice_1").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/create-user",
            None,
            Some(json!({"username": "alice_1", "e_mail": "other@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already taken!");

    let (status, body) = app
        .call(
            Method::POST,
            "/create-user",
            None,
            Some(json!({"username": "alice_2", "email": "alice_1@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "E-mail already taken!");
}

#[tokio::test]
async fn test_login_failures_are_uniform() {
    let app = TestApp::new();
    app.signup("alice_1").await;

    for (username, password) in [("alice_1", "wrong password"), ("nobody_here", PASSWORD)] {
        let (status, body) = app.login(username, password).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Could not verify!");
    }

    let (status, _) = app.call(Method::GET, "/login", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app
        .call(Method::GET, "/api/v1/shopping-lists", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is missing!");

    let (status, body) = app
        .call(Method::GET, "/api/v1/shopping-lists", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is invalid!");
}

#[tokio::test]
async fn test_token_expiry_is_exclusive() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    let tokens = tokens();
    let public_id = tokens.verify(&token).unwrap().public_id;

    let fresh = tokens
        .issue_at(public_id, Utc::now() - TimeDelta::minutes(89))
        .unwrap();
    let (status, _) = app
        .call(Method::GET, "/api/v1/user/profile", Some(&fresh), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let expired = tokens
        .issue_at(public_id, Utc::now() - TimeDelta::minutes(90))
        .unwrap();
    let (status, body) = app
        .call(Method::GET, "/api/v1/user/profile", Some(&expired), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is invalid!");
}

#[tokio::test]
async fn test_profile_lifecycle() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;

    let (status, body) = app
        .call(Method::GET, "/api/v1/user/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Profile does not exist!");

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/v1/user/profile",
            Some(&token),
            Some(json!({"first_name": "Alice", "last_name": "Smith"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Alice");

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/v1/user/profile",
            Some(&token),
            Some(json!({"first_name": "A", "last_name": "Smith"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::GET, "/api/v1/user/profile", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Smith");
}

#[tokio::test]
async fn test_forgot_password_without_mail_transport() {
    let app = TestApp::without_mail();
    app.signup("alice_1").await;

    for _ in 0..3 {
        let (status, body) = app
            .call(
                Method::POST,
                "/forgot-password",
                None,
                Some(json!({"username": "alice_1"})),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
    assert!(app.sent_mail().is_empty());
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = TestApp::new();
    app.signup("alice_1").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/forgot-password",
            None,
            Some(json!({"username": "nobody_here"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User does not exist!");

    let (status, _) = app
        .call(
            Method::POST,
            "/forgot-password",
            None,
            Some(json!({"username": "alice_1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let mail = app.sent_mail();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].recipients, vec!["alice_1@example.com".to_owned()]);
    let reset_token = mail[0].body.lines().nth(4).unwrap().to_owned();

    let (status, body) = app
        .call(
            Method::POST,
            "/reset-password",
            Some(&reset_token),
            Some(json!({"new_password": "new password 1", "confirm_password": "new password 2"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match!");

    let (status, _) = app
        .call(
            Method::POST,
            "/reset-password",
            Some(&reset_token),
            Some(json!({"new_password": "new password 1", "confirm_password": "new password 1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("alice_1", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("alice_1", "new password 1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    app.call(
        Method::POST,
        "/api/v1/shopping-lists",
        Some(&token),
        Some(json!({"list_name": "Groceries", "item_list": [{"name": "Milk", "quantity": 2}]})),
    )
    .await;

    let (status, body) = app
        .call(
            Method::DELETE,
            "/api/v1/user",
            Some(&token),
            Some(json!({"password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Could not verify!");

    let (status, _) = app
        .call(
            Method::DELETE,
            "/api/v1/user",
            Some(&token),
            Some(json!({"password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // the token outlives the account but no longer resolves
    let (status, _) = app
        .call(Method::GET, "/api/v1/shopping-lists", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the name is free again and the new account starts empty
    let token = app.signup("alice_1").await;
    let (status, body) = app
        .call(Method::GET, "/api/v1/shopping-lists", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No shopping lists on this user!");
}
