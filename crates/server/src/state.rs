//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Store;
use crate::services::auth::TokenAuthority;
use crate::services::email::Mailer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and gives handlers the store,
/// the token authority and the mailer. It is generic over the store so the
/// same router serves `PostgreSQL` in production and memory in tests.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    tokens: TokenAuthority,
    mailer: Mailer,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing store for users, lists and items
    /// * `tokens` - Issues and verifies bearer tokens
    /// * `mailer` - Sends password-reset mail
    #[must_use]
    pub fn new(store: S, tokens: TokenAuthority, mailer: Mailer) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                tokens,
                mailer,
            }),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to the token authority.
    #[must_use]
    pub fn tokens(&self) -> &TokenAuthority {
        &self.inner.tokens
    }

    /// Get a reference to the mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }
}
