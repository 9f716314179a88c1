//! Shoplist server library.
//!
//! Accounts, owner-scoped shopping lists and items, and time-bucketed
//! consumption summaries behind a bearer-token gate. The router is exposed
//! as a library so it can be driven in-process by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

use axum::{Router, http::Request, middleware as axum_middleware};
use tower_http::trace::TraceLayer;

use crate::db::Store;
use crate::state::AppState;

/// Build the API router with request tracing and request ids.
///
/// Sentry layers are added by the binary so tests run without a hub.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    routes::routes()
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
}
