//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shoplist-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPLIST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/server/migrations/`, embedded at compile time.

use shoplist_server::db::create_pool;

use super::{CommandError, database_url};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
