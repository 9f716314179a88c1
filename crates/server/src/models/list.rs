//! Shopping list and item domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shoplist_core::{ItemId, ItemName, ListId, Quantity, UserId};

/// A named shopping list owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    pub id: ListId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An item on a shopping list.
///
/// Items carry no user reference; ownership is always established through
/// the list they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(skip)]
    pub list_id: ListId,
    pub name: String,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated item waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: ItemName,
    pub quantity: Quantity,
}

/// Before/after values of an item update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    pub before: Item,
    pub after: Item,
}
