//! Item operations.
//!
//! Items carry no user reference. Every lookup starts from the caller's lists,
//! so an item on someone else's list is indistinguishable from one that does
//! not exist.

use serde::Deserialize;
use serde_json::Value;

use shoplist_core::{ItemId, ItemName, Quantity};

use super::ServiceError;
use crate::db::Store;
use crate::models::{Identity, Item, ItemUpdate, NewItem};

/// One entry of an item batch as submitted by a client.
///
/// The quantity stays loosely typed until [`ItemInput::validate`] coerces it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemInput {
    #[serde(alias = "Item")]
    pub name: String,
    #[serde(alias = "Quantity")]
    pub quantity: Value,
}

impl ItemInput {
    /// Validate the name, then coerce the quantity.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Name` or `ServiceError::Quantity` naming the
    /// first rule broken.
    pub fn validate(&self) -> Result<NewItem, ServiceError> {
        Ok(NewItem {
            name: ItemName::parse(&self.name)?,
            quantity: Quantity::coerce(&self.quantity)?,
        })
    }
}

/// Validate every entry of a batch before anything is written.
///
/// # Errors
///
/// Returns the error of the first invalid entry.
pub fn validate_batch(inputs: &[ItemInput]) -> Result<Vec<NewItem>, ServiceError> {
    inputs.iter().map(ItemInput::validate).collect()
}

/// Items grouped under the name of the list holding them.
pub type ItemsByList = Vec<(String, Vec<Item>)>;

/// Item service.
pub struct ItemService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> ItemService<'a, S> {
    /// Create a new item service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add a batch of items to one of the caller's lists.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the caller has no list with that
    /// name and a validation error if the batch is empty or any entry is
    /// invalid; nothing is written in either case.
    pub async fn add(
        &self,
        owner: &Identity,
        list_name: &str,
        inputs: &[ItemInput],
    ) -> Result<Vec<Item>, ServiceError> {
        let list = self
            .store
            .find_list(owner.user_id, list_name)
            .await?
            .ok_or_else(|| ServiceError::NotFound("List name does not exist!".to_owned()))?;

        if inputs.is_empty() {
            return Err(ServiceError::Invalid("Item list cannot be empty!".to_owned()));
        }
        let items = validate_batch(inputs)?;

        let inserted = self.store.add_items(list.id, &items).await?;
        tracing::info!(
            user_id = %owner.user_id,
            list_id = %list.id,
            count = inserted.len(),
            "Items added"
        );
        Ok(inserted)
    }

    /// Read items, either of one list or of all the caller's lists.
    ///
    /// Lists without items are omitted from the all-lists view.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the named list is absent or empty,
    /// or, without a name, if the caller has no items at all.
    pub async fn read(
        &self,
        owner: &Identity,
        list_name: Option<&str>,
    ) -> Result<ItemsByList, ServiceError> {
        if let Some(name) = list_name {
            let list = self
                .store
                .find_list(owner.user_id, name)
                .await?
                .ok_or_else(|| ServiceError::NotFound("List name does not exist!".to_owned()))?;

            let items = self.store.items_in_list(list.id).await?;
            if items.is_empty() {
                return Err(ServiceError::NotFound("No items on this list!".to_owned()));
            }
            return Ok(vec![(list.name, items)]);
        }

        let mut grouped = Vec::new();
        for list in self.store.lists_for(owner.user_id).await? {
            let items = self.store.items_in_list(list.id).await?;
            if !items.is_empty() {
                grouped.push((list.name, items));
            }
        }

        if grouped.is_empty() {
            return Err(ServiceError::NotFound("No items on this user!".to_owned()));
        }
        Ok(grouped)
    }

    /// Overwrite the name and quantity of one of the caller's items.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, checked before the lookup,
    /// and `ServiceError::NotFound` if none of the caller's lists holds the item.
    pub async fn update(
        &self,
        owner: &Identity,
        id: ItemId,
        input: &ItemInput,
    ) -> Result<ItemUpdate, ServiceError> {
        let update = input.validate()?;
        let before = self.locate(owner, id).await?;

        let after = self.store.update_item(before.list_id, id, &update).await?;
        tracing::info!(user_id = %owner.user_id, item_id = %id, "Item updated");
        Ok(ItemUpdate { before, after })
    }

    /// Delete one of the caller's items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if none of the caller's lists holds the item.
    pub async fn delete(&self, owner: &Identity, id: ItemId) -> Result<(), ServiceError> {
        let item = self.locate(owner, id).await?;

        if !self.store.delete_item(item.list_id, id).await? {
            return Err(item_not_found());
        }
        tracing::info!(user_id = %owner.user_id, item_id = %id, "Item deleted");
        Ok(())
    }

    /// Find an item by scanning the caller's lists; ids are unique across
    /// lists, so the first match is the only one.
    async fn locate(&self, owner: &Identity, id: ItemId) -> Result<Item, ServiceError> {
        let lists = self.store.lists_for(owner.user_id).await?;
        if lists.is_empty() {
            return Err(ServiceError::NotFound(
                "No shopping lists on this user!".to_owned(),
            ));
        }

        for list in lists {
            if let Some(item) = self.store.find_item(list.id, id).await? {
                return Ok(item);
            }
        }
        Err(item_not_found())
    }
}

fn item_not_found() -> ServiceError {
    ServiceError::NotFound("No item with those parameters on this user!".to_owned())
}
