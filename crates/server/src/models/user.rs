//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shoplist_core::{Email, PersonName, PublicId, UserId, Username};

/// A registered account (domain type).
///
/// Carries no password hash; the hash is only ever fetched alongside a user
/// when a password needs verifying.
#[derive(Debug, Clone)]
pub struct User {
    /// Internal row id.
    pub id: UserId,
    /// Stable identifier embedded in bearer tokens.
    pub public_id: PublicId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub public_id: PublicId,
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
}

/// Display-name profile, one-to-one with a user and created on first edit.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(skip)]
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller of a protected operation, as resolved from a bearer token.
///
/// Everything downstream of the auth gate scopes its work by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub public_id: PublicId,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            public_id: user.public_id,
            username: user.username.clone(),
        }
    }
}

/// Validated input for editing a profile.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: PersonName,
    pub last_name: PersonName,
}
