//! Storage for Shoplist.
//!
//! # Database: `shoplist` schema
//!
//! ## Tables
//!
//! - `user` - Accounts (unique username, email and public id)
//! - `user_profile` - Optional display names, one row per user
//! - `shopping_list` - Lists, unique per `(user_id, name)`
//! - `item` - Items on a list
//!
//! Deletion cascades downward through foreign keys: user -> profile, user ->
//! list -> item.
//!
//! # Repositories
//!
//! Persistence is expressed as three traits, [`UserStore`], [`ListStore`] and
//! [`ItemStore`], bundled as [`Store`]. [`PgStore`] implements them on
//! `PostgreSQL`; [`MemoryStore`] implements the same contract in process for
//! tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shoplist-cli -- migrate
//! ```

pub mod items;
pub mod lists;
pub mod memory;
pub mod users;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shoplist_core::{ItemId, ListId, ListName, PublicId, UserId};

use crate::models::{Item, NewItem, NewUser, Profile, ProfileUpdate, ShoppingList, User};

pub use memory::MemoryStore;

/// Attempts made for an operation that keeps hitting transient contention.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff unit between attempts; attempt `n` waits `n` units.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Accounts and profiles.
pub trait UserStore: Send + Sync {
    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` naming the field if the username or
    /// email is already taken.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by the public identifier carried in tokens.
    fn get_by_public_id(
        &self,
        public_id: PublicId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user together with their password hash, by username.
    fn get_password_hash(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Get the password hash of a user by internal id.
    fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Replace a user's password hash.
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a user's profile, if one was ever created.
    fn get_profile(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Create the profile if absent, otherwise overwrite its names.
    fn upsert_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Delete a user with their profile, lists and items.
    ///
    /// Returns `false` if the user didn't exist.
    fn delete_user(&self, id: UserId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Shopping lists. Every method is scoped by the owning user.
pub trait ListStore: Send + Sync {
    /// Insert a list and its initial items atomically.
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a list with
    /// this name; nothing is written in that case.
    fn create_list(
        &self,
        owner: UserId,
        name: &ListName,
        items: &[NewItem],
    ) -> impl Future<Output = Result<(ShoppingList, Vec<Item>), RepositoryError>> + Send;

    /// Find one of the owner's lists by name.
    fn find_list(
        &self,
        owner: UserId,
        name: &str,
    ) -> impl Future<Output = Result<Option<ShoppingList>, RepositoryError>> + Send;

    /// All of the owner's lists, oldest first.
    fn lists_for(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<ShoppingList>, RepositoryError>> + Send;

    /// Rename one of the owner's lists.
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no such list and
    /// `RepositoryError::Conflict` if the new name is taken by another of
    /// their lists.
    fn rename_list(
        &self,
        owner: UserId,
        id: ListId,
        new_name: &ListName,
    ) -> impl Future<Output = Result<ShoppingList, RepositoryError>> + Send;

    /// Delete one of the owner's lists together with its items.
    ///
    /// Returns `false` if the owner has no such list.
    fn delete_list(
        &self,
        owner: UserId,
        id: ListId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Items. Every method is scoped by the containing list; callers establish
/// that the list belongs to the requesting user first.
pub trait ItemStore: Send + Sync {
    /// Insert a batch of items atomically.
    fn add_items(
        &self,
        list: ListId,
        items: &[NewItem],
    ) -> impl Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    /// All items on a list, oldest first.
    fn items_in_list(
        &self,
        list: ListId,
    ) -> impl Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    /// Items on a list created strictly between `start` and `end`.
    fn items_created_between(
        &self,
        list: ListId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    /// Find an item by id within a list.
    fn find_item(
        &self,
        list: ListId,
        id: ItemId,
    ) -> impl Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// Overwrite an item's name and quantity.
    ///
    /// Returns `RepositoryError::NotFound` if the list holds no such item.
    fn update_item(
        &self,
        list: ListId,
        id: ItemId,
        item: &NewItem,
    ) -> impl Future<Output = Result<Item, RepositoryError>> + Send;

    /// Delete an item. Returns `false` if the list holds no such item.
    fn delete_item(
        &self,
        list: ListId,
        id: ItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Everything the services need from storage.
pub trait Store: UserStore + ListStore + ItemStore + Clone + 'static {
    /// Check that the backing store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// `PostgreSQL` implementation of the repository traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run `op` again when it fails with transient contention.
///
/// Each attempt is expected to open and commit its own transaction, so a
/// failed attempt has already been rolled back when the next one starts.
pub(crate) async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(RepositoryError::Database(ref e)) if attempt < MAX_ATTEMPTS && is_transient(e) => {
                tracing::warn!(attempt, error = %e, "Transient database error, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Serialization failures and deadlocks are safe to retry.
fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
        }
        _ => false,
    }
}

/// Map a unique violation to `RepositoryError::Conflict`, passing the violated
/// constraint name to `describe`.
pub(crate) fn conflict_or_database(
    e: sqlx::Error,
    describe: impl FnOnce(Option<&str>) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(describe(db_err.constraint()));
    }
    RepositoryError::Database(e)
}
