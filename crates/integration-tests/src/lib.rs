//! Integration tests for Shoplist.
//!
//! The tests drive the real router in-process with `tower::ServiceExt::oneshot`
//! against the in-memory store, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shoplist-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `accounts` - Registration, login, tokens, profiles, password reset
//! - `shopping_lists` - List CRUD, cascades and ownership isolation
//! - `items` - Item CRUD and validation
//! - `analytics` - Time-bucketed summaries

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use shoplist_server::db::MemoryStore;
use shoplist_server::services::auth::TokenAuthority;
use shoplist_server::services::email::{Mailer, Outbox, OutgoingEmail};
use shoplist_server::state::AppState;

/// Signing secret shared by every test app.
pub const TEST_SECRET: &str = "k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6";

/// Password used by [`TestApp::signup`].
pub const PASSWORD: &str = "correct horse";

/// An in-process API backed by memory.
pub struct TestApp {
    router: Router,
    outbox: Outbox,
    clock: Option<Arc<Mutex<DateTime<Utc>>>>,
}

impl TestApp {
    /// App whose store stamps rows with the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::build(MemoryStore::new(), None, true)
    }

    /// App built the way the binary is when SMTP is unset.
    #[must_use]
    pub fn without_mail() -> Self {
        Self::build(MemoryStore::new(), None, false)
    }

    /// App whose store stamps rows with a clock the test moves by hand.
    #[must_use]
    pub fn with_clock(start: DateTime<Utc>) -> Self {
        let now = Arc::new(Mutex::new(start));
        let clock = Arc::clone(&now);
        let store = MemoryStore::with_clock(move || *clock.lock().unwrap());
        Self::build(store, Some(now), true)
    }

    fn build(
        store: MemoryStore,
        clock: Option<Arc<Mutex<DateTime<Utc>>>>,
        capture_mail: bool,
    ) -> Self {
        let outbox = Outbox::default();
        let mailer = if capture_mail {
            Mailer::Outbox(outbox.clone())
        } else {
            Mailer::from_config(None).unwrap()
        };
        let state = AppState::new(store, tokens(), mailer);
        Self {
            router: shoplist_server::app(state),
            outbox,
            clock,
        }
    }

    /// Move the store clock. Panics for apps built with [`TestApp::new`].
    pub fn set_time(&self, at: DateTime<Utc>) {
        *self.clock.as_ref().unwrap().lock().unwrap() = at;
    }

    /// Mail captured so far.
    #[must_use]
    pub fn sent_mail(&self) -> Vec<OutgoingEmail> {
        self.outbox.messages()
    }

    /// Send a request and return the status and JSON body (`Null` if empty or not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Send `body` as JSON, with a bearer token when given.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Log in with HTTP Basic credentials.
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        let request = Request::builder()
            .uri("/login")
            .header(header::AUTHORIZATION, format!("Basic {credentials}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Register `username` with [`PASSWORD`] and return a fresh token.
    pub async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/create-user",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");

        let (status, body) = self.login(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_owned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// The token authority every test app signs with.
#[must_use]
pub fn tokens() -> TokenAuthority {
    TokenAuthority::new(SecretString::from(TEST_SECRET), TimeDelta::minutes(90))
}
