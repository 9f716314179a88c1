//! Account maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! shoplist-cli purge-user --username alice_1
//! ```

use shoplist_server::db::{PgStore, UserStore, create_pool};

use super::{CommandError, database_url};

/// Delete an account along with its profile, lists and items.
///
/// # Errors
///
/// Returns `CommandError::UnknownUser` if no account has that username.
pub async fn purge(username: &str) -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let store = PgStore::new(create_pool(&database_url).await?);

    let user = store
        .get_by_username(username)
        .await?
        .ok_or_else(|| CommandError::UnknownUser(username.to_owned()))?;

    if !store.delete_user(user.id).await? {
        return Err(CommandError::UnknownUser(username.to_owned()));
    }

    tracing::info!(user_id = %user.id, "User purged: {}", username);
    Ok(())
}
