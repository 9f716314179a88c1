//! `PostgreSQL` user and profile repository.

use chrono::{DateTime, Utc};

use shoplist_core::{Email, PublicId, UserId};

use super::{PgStore, RepositoryError, UserStore, conflict_or_database};
use crate::models::{NewUser, Profile, ProfileUpdate, User};

const USER_COLUMNS: &str = "id, public_id, username, email, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    public_id: PublicId,
    username: String,
    email: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            public_id: r.public_id,
            username: r.username,
            email: r.email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: UserId,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(r: ProfileRow) -> Self {
        Self {
            user_id: r.user_id,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn describe_user_conflict(constraint: Option<&str>) -> String {
    match constraint {
        Some("user_email_key") => "E-mail already taken!".to_owned(),
        _ => "Username already taken!".to_owned(),
    }
}

impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shoplist.user (public_id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.public_id)
        .bind(user.username.as_str())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(|e| conflict_or_database(e, describe_user_conflict))?;

        Ok(row.into())
    }

    async fn get_by_public_id(&self, public_id: PublicId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM shoplist.user WHERE public_id = $1"
        ))
        .bind(public_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM shoplist.user WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shoplist.user WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    async fn get_password_hash_by_id(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM shoplist.user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(hash)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shoplist.user
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r"
            SELECT user_id, first_name, last_name, created_at, updated_at
            FROM shoplist.user_profile
            WHERE user_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn upsert_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row: ProfileRow = sqlx::query_as(
            r"
            INSERT INTO shoplist.user_profile (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = NOW()
            RETURNING user_id, first_name, last_name, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.first_name.as_str())
        .bind(update.last_name.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            // The user row vanished between authentication and this write.
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(row.into())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shoplist.user WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
