//! HTTP route handlers for the Shoplist API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (store reachable)
//!
//! # Accounts
//! POST   /create-user                     - Register
//! GET    /login                           - Exchange basic credentials for a token
//! POST   /forgot-password                 - Mail a reset token
//! POST   /reset-password                  - Set a new password (token)
//!
//! # User (token)
//! GET    /api/v1/user/profile             - Read profile
//! PUT    /api/v1/user/profile             - Create or edit profile
//! DELETE /api/v1/user                     - Delete account (password)
//!
//! # Shopping lists (token)
//! POST   /api/v1/shopping-lists           - Create list with optional items
//! GET    /api/v1/shopping-lists           - List names
//! PUT    /api/v1/shopping-lists           - Rename list
//! DELETE /api/v1/shopping-lists           - Delete list (password)
//! GET    /api/v1/shopping-lists/overview  - Time-bucketed summary
//!
//! # Items (token)
//! POST   /api/v1/shopping-lists/items     - Add items to a list
//! GET    /api/v1/shopping-lists/items     - Read items, optionally of one list
//! PUT    /api/v1/shopping-lists/items     - Update an item
//! DELETE /api/v1/shopping-lists/items     - Delete an item
//! ```

pub mod analytics;
pub mod items;
pub mod lists;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::db::Store;
use crate::error::AppError;
use crate::state::AppState;

/// JSON request body whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `{"msg": ...}` success body.
pub(crate) fn message(msg: impl Into<String>) -> axum::Json<Value> {
    axum::Json(json!({ "msg": msg.into() }))
}

/// Create the account routes router.
pub fn account_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/create-user", post(users::create_user))
        .route("/login", get(users::login))
        .route("/forgot-password", post(users::forgot_password))
        .route("/reset-password", post(users::reset_password))
}

/// Create the user routes router.
pub fn user_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", delete(users::delete_account))
        .route(
            "/profile",
            get(users::get_profile).put(users::edit_profile),
        )
}

/// Create the shopping list routes router.
pub fn shopping_list_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(lists::index)
                .post(lists::create)
                .put(lists::rename)
                .delete(lists::delete),
        )
        .route(
            "/items",
            get(items::read)
                .post(items::create)
                .put(items::update)
                .delete(items::delete),
        )
        .route("/overview", get(analytics::overview))
}

/// Create all routes for the API.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .merge(account_routes())
        .nest("/api/v1/user", user_routes())
        .nest("/api/v1/shopping-lists", shopping_list_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
