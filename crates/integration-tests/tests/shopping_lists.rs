//! Shopping list CRUD, cascades and ownership isolation.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use shoplist_integration_tests::{PASSWORD, TestApp};

const LISTS: &str = "/api/v1/shopping-lists";

async fn create_list(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    app.call(Method::POST, LISTS, Some(token), Some(body)).await
}

async fn list_names(app: &TestApp, token: &str) -> (StatusCode, Value) {
    app.call(Method::GET, LISTS, Some(token), None).await
}

#[tokio::test]
async fn test_create_and_list() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;

    let (status, body) = list_names(&app, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No shopping lists on this user!");

    let (status, body) = create_list(&app, &token, json!({"list_name": "Groceries"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Shopping list added successfully!");
    create_list(
        &app,
        &token,
        json!({"list_name": "Hardware", "item_list": [{"Item": "Nails", "Quantity": "100"}]}),
    )
    .await;

    let (status, body) = list_names(&app, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"all_lists": ["Groceries", "Hardware"]}));
}

#[tokio::test]
async fn test_create_validation_has_no_side_effects() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;

    let (status, body) = create_list(&app, &token, json!({"list_name": "G"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "List name is too short!");

    for (item, expected) in [
        (json!({"name": "Milk", "quantity": "-1"}), "Quantity cannot be negative!"),
        (json!({"name": "Milk", "quantity": "abc"}), "Quantity must be numeric!"),
        (json!({"name": "Mi!k", "quantity": 1}), "Item name contains special characters!"),
    ] {
        let (status, body) = create_list(
            &app,
            &token,
            json!({"list_name": "Groceries", "item_list": [{"name": "Bread", "quantity": 1}, item]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], expected);
    }

    let (status, _) = list_names(&app, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_fields_are_rejected() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;

    let (status, body) = create_list(
        &app,
        &token,
        json!({"list_name": "Groceries", "item_list": [{"name": "Milk", "quantity": 1, "colour": "white"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_name_conflicts() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    create_list(&app, &token, json!({"list_name": "Groceries"})).await;

    let (status, body) = create_list(&app, &token, json!({"list_name": "Groceries"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "List name already taken!");
}

#[tokio::test]
async fn test_same_name_for_different_users() {
    let app = TestApp::new();
    let alice = app.signup("alice_1").await;
    let bob = app.signup("bob_one").await;

    let (status, _) = create_list(&app, &alice, json!({"list_name": "Groceries"})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = create_list(&app, &bob, json!({"list_name": "Groceries"})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rename_round_trip() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    create_list(&app, &token, json!({"list_name": "Groceries"})).await;

    let (status, body) = app
        .call(
            Method::PUT,
            LISTS,
            Some(&token),
            Some(json!({"old_name": "Groceries", "new_name": "Weekly shop"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Shopping list name updated!");

    let (_, body) = list_names(&app, &token).await;
    assert_eq!(body, json!({"all_lists": ["Weekly shop"]}));
}

#[tokio::test]
async fn test_rename_errors() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    create_list(&app, &token, json!({"list_name": "Groceries"})).await;
    create_list(&app, &token, json!({"list_name": "Hardware"})).await;

    let rename = |old: &str, new: &str| json!({"old_name": old, "new_name": new});
    let (status, body) = app
        .call(Method::PUT, LISTS, Some(&token), Some(rename("Missing", "Anything")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "List name does not exist!");

    let (status, _) = app
        .call(Method::PUT, LISTS, Some(&token), Some(rename("Groceries", "H")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PUT, LISTS, Some(&token), Some(rename("Groceries", "Hardware")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_requires_password_and_cascades() {
    let app = TestApp::new();
    let token = app.signup("alice_1").await;
    create_list(
        &app,
        &token,
        json!({"list_name": "Groceries", "item_list": [{"name": "Milk", "quantity": 2}]}),
    )
    .await;

    let delete = |password: &str| json!({"list_name": "Groceries", "user_password": password});
    let (status, body) = app
        .call(Method::DELETE, LISTS, Some(&token), Some(delete("wrong password")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Could not verify!");

    let (status, body) = app
        .call(Method::DELETE, LISTS, Some(&token), Some(delete(PASSWORD)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Shopping list successfully deleted!");

    let (status, body) = app
        .call(Method::GET, "/api/v1/shopping-lists/items", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No items on this user!");

    let (status, _) = app
        .call(Method::DELETE, LISTS, Some(&token), Some(delete(PASSWORD)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_lists_are_not_found() {
    let app = TestApp::new();
    let alice = app.signup("alice_1").await;
    let bob = app.signup("bob_one").await;
    create_list(&app, &alice, json!({"list_name": "Groceries"})).await;

    let (status, _) = app
        .call(
            Method::PUT,
            LISTS,
            Some(&bob),
            Some(json!({"old_name": "Groceries", "new_name": "Mine now"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::DELETE,
            LISTS,
            Some(&bob),
            Some(json!({"list_name": "Groceries", "user_password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = list_names(&app, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = list_names(&app, &alice).await;
    assert_eq!(body, json!({"all_lists": ["Groceries"]}));
}
