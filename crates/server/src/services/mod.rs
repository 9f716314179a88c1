//! Business logic services for Shoplist.
//!
//! # Services
//!
//! - `auth` - Accounts, password hashing and bearer tokens
//! - `accounts` - Profiles, account deletion and password-reset mail
//! - `lists` - Shopping list CRUD scoped to the caller
//! - `items` - Item CRUD scoped through the caller's lists
//! - `analytics` - Time-bucketed consumption summaries
//! - `email` - Outbound mail
//!
//! Services borrow the store for the duration of one request and take the
//! caller's [`Identity`](crate::models::Identity) as their first argument; they
//! never see data outside the ownership chain rooted at that identity.

pub mod accounts;
pub mod analytics;
pub mod auth;
pub mod email;
pub mod items;
pub mod lists;

use thiserror::Error;

use shoplist_core::{GranularityError, NameError, QuantityError};

use crate::db::RepositoryError;

pub use auth::AuthError;
pub use email::EmailError;

/// Errors raised by the resource, analytics and account services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A list, item or profile name failed validation.
    #[error("{0}")]
    Name(#[from] NameError),

    /// An item quantity failed coercion.
    #[error("{0}")]
    Quantity(#[from] QuantityError),

    /// Unknown bucket granularity.
    #[error("{0}")]
    Granularity(#[from] GranularityError),

    /// Any other malformed input.
    #[error("{0}")]
    Invalid(String),

    /// The requested resource is not reachable from the caller's account.
    #[error("{0}")]
    NotFound(String),

    /// The write would violate a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    /// Password re-verification or account resolution failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Mail delivery failed.
    #[error("email error: {0}")]
    Email(#[from] EmailError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::NotFound => Self::NotFound("Resource not found!".to_owned()),
            other => Self::Repository(other),
        }
    }
}
