//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is JSON `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, EmailError, ServiceError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication or account rule failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Outbound mail failed.
    #[error("Email error: {0}")]
    Email(EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would break a uniqueness rule.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Email(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::Missing
                | AuthError::Invalid
                | AuthError::UnknownSubject
                | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::UnknownUser => StatusCode::BAD_REQUEST,
                AuthError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Signing => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client.
    fn public_message(&self) -> String {
        match self {
            _ if self.status().is_server_error() => "Internal server error".to_owned(),
            Self::Auth(err) => err.to_string(),
            Self::NotFound(msg) | Self::Conflict(msg) | Self::BadRequest(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Name(_)
            | ServiceError::Quantity(_)
            | ServiceError::Granularity(_)
            | ServiceError::Invalid(_) => Self::BadRequest(e.to_string()),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            ServiceError::Conflict(msg) => Self::Conflict(msg),
            ServiceError::Auth(err) => Self::Auth(err),
            ServiceError::Email(err) => err.into(),
            ServiceError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(e: EmailError) -> Self {
        match e {
            EmailError::NotConfigured => Self::Internal(e.to_string()),
            e => Self::Email(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated caller.
///
/// Called by the auth extractor so errors are associated with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("lists", "Shopping list deleted", Some(&[("list_name", "Groceries")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
