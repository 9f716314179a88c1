//! `PostgreSQL` item repository.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use shoplist_core::{ItemId, ListId, Quantity};

use super::{ItemStore, PgStore, RepositoryError, with_retry};
use crate::models::{Item, NewItem};

pub(super) const ITEM_COLUMNS: &str = "id, list_id, name, quantity, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ItemRow {
    id: ItemId,
    list_id: ListId,
    name: String,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(r: ItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(r.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity for item {}: {e}", r.id))
        })?;

        Ok(Self {
            id: r.id,
            list_id: r.list_id,
            name: r.name,
            quantity,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

pub(super) fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, RepositoryError> {
    rows.into_iter().map(Item::try_from).collect()
}

/// Insert items one by one on an open connection, usually a transaction.
pub(super) async fn insert_items(
    conn: &mut PgConnection,
    list: ListId,
    items: &[NewItem],
) -> Result<Vec<Item>, RepositoryError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row: ItemRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shoplist.item (list_id, name, quantity)
            VALUES ($1, $2, $3)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(list)
        .bind(item.name.as_str())
        .bind(item.quantity.as_i32())
        .fetch_one(&mut *conn)
        .await?;

        inserted.push(row.try_into()?);
    }
    Ok(inserted)
}

impl PgStore {
    async fn try_add_items(
        &self,
        list: ListId,
        items: &[NewItem],
    ) -> Result<Vec<Item>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let inserted = insert_items(&mut tx, list, items).await?;
        tx.commit().await?;
        Ok(inserted)
    }
}

impl ItemStore for PgStore {
    async fn add_items(&self, list: ListId, items: &[NewItem]) -> Result<Vec<Item>, RepositoryError> {
        with_retry(move || self.try_add_items(list, items)).await
    }

    async fn items_in_list(&self, list: ListId) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM shoplist.item
            WHERE list_id = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(list)
        .fetch_all(self.pool())
        .await?;

        into_items(rows)
    }

    async fn items_created_between(
        &self,
        list: ListId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Item>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r"
            SELECT {ITEM_COLUMNS}
            FROM shoplist.item
            WHERE list_id = $1 AND created_at > $2 AND created_at < $3
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(list)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;

        into_items(rows)
    }

    async fn find_item(&self, list: ListId, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM shoplist.item WHERE id = $1 AND list_id = $2"
        ))
        .bind(id)
        .bind(list)
        .fetch_optional(self.pool())
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn update_item(
        &self,
        list: ListId,
        id: ItemId,
        item: &NewItem,
    ) -> Result<Item, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            r"
            UPDATE shoplist.item
            SET name = $3, quantity = $4, updated_at = NOW()
            WHERE id = $1 AND list_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(list)
        .bind(item.name.as_str())
        .bind(item.quantity.as_i32())
        .fetch_optional(self.pool())
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_item(&self, list: ListId, id: ItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shoplist.item WHERE id = $1 AND list_id = $2")
            .bind(id)
            .bind(list)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
