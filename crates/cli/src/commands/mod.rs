//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;
use thiserror::Error;

/// Errors shared by commands that talk to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] shoplist_server::db::RepositoryError),

    /// No account with the given username.
    #[error("No user named {0}")]
    UnknownUser(String),
}

/// Read `SHOPLIST_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("SHOPLIST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOPLIST_DATABASE_URL"))
}
