//! `PostgreSQL` shopping list repository.

use chrono::{DateTime, Utc};

use shoplist_core::{ListId, ListName, UserId};

use super::items::insert_items;
use super::{ListStore, PgStore, RepositoryError, conflict_or_database, with_retry};
use crate::models::{Item, NewItem, ShoppingList};

const LIST_COLUMNS: &str = "id, user_id, name, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ListRow {
    id: ListId,
    user_id: UserId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for ShoppingList {
    fn from(r: ListRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

fn duplicate_list(_: Option<&str>) -> String {
    "List name already exists!".to_owned()
}

impl PgStore {
    async fn try_create_list(
        &self,
        owner: UserId,
        name: &ListName,
        items: &[NewItem],
    ) -> Result<(ShoppingList, Vec<Item>), RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let row: ListRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shoplist.shopping_list (user_id, name)
            VALUES ($1, $2)
            RETURNING {LIST_COLUMNS}
            "
        ))
        .bind(owner)
        .bind(name.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_database(e, duplicate_list))?;

        let list = ShoppingList::from(row);
        let inserted = insert_items(&mut tx, list.id, items).await?;

        tx.commit().await?;
        Ok((list, inserted))
    }
}

impl ListStore for PgStore {
    async fn create_list(
        &self,
        owner: UserId,
        name: &ListName,
        items: &[NewItem],
    ) -> Result<(ShoppingList, Vec<Item>), RepositoryError> {
        with_retry(move || self.try_create_list(owner, name, items)).await
    }

    async fn find_list(
        &self,
        owner: UserId,
        name: &str,
    ) -> Result<Option<ShoppingList>, RepositoryError> {
        let row: Option<ListRow> = sqlx::query_as(&format!(
            "SELECT {LIST_COLUMNS} FROM shoplist.shopping_list WHERE user_id = $1 AND name = $2"
        ))
        .bind(owner)
        .bind(name)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(ShoppingList::from))
    }

    async fn lists_for(&self, owner: UserId) -> Result<Vec<ShoppingList>, RepositoryError> {
        let rows: Vec<ListRow> = sqlx::query_as(&format!(
            r"
            SELECT {LIST_COLUMNS}
            FROM shoplist.shopping_list
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(owner)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(ShoppingList::from).collect())
    }

    async fn rename_list(
        &self,
        owner: UserId,
        id: ListId,
        new_name: &ListName,
    ) -> Result<ShoppingList, RepositoryError> {
        let row: Option<ListRow> = sqlx::query_as(&format!(
            r"
            UPDATE shoplist.shopping_list
            SET name = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {LIST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(owner)
        .bind(new_name.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| conflict_or_database(e, duplicate_list))?;

        row.map(ShoppingList::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete_list(&self, owner: UserId, id: ListId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM shoplist.shopping_list WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
