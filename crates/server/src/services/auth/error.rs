//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token was presented.
    #[error("Token is missing!")]
    Missing,

    /// Token is malformed, has a bad signature, or has expired.
    #[error("Token is invalid!")]
    Invalid,

    /// Token is valid but its subject no longer exists.
    #[error("Token is invalid!")]
    UnknownSubject,

    /// Invalid credentials (wrong password or user not found).
    #[error("Could not verify!")]
    InvalidCredentials,

    /// Invalid email format.
    #[error("E-mail is not valid!")]
    InvalidEmail(#[from] shoplist_core::EmailError),

    /// Username fails the account rules.
    #[error("{0}")]
    InvalidUsername(#[from] shoplist_core::UsernameError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// New password and its confirmation differ.
    #[error("Passwords do not match!")]
    PasswordMismatch,

    /// No account with the given username.
    #[error("User does not exist!")]
    UnknownUser,

    /// Username or email already taken; carries which.
    #[error("{0}")]
    UserAlreadyExists(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing error.
    #[error("token signing error")]
    Signing,
}
