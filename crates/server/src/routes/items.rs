//! Item route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use shoplist_core::ItemId;

use super::{ApiJson, ApiQuery, message};
use crate::db::Store;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::items::{ItemInput, ItemService, ItemsByList};
use crate::state::AppState;

/// Batch of items for an existing list.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateItemsForm {
    pub list_name: String,
    pub item_list: Vec<ItemInput>,
}

/// Optional list filter for reads.
#[derive(Debug, Default, Deserialize)]
pub struct ReadItemsQuery {
    pub list_name: Option<String>,
}

/// New name and quantity for an item.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemForm {
    pub id: ItemId,
    pub item_name: String,
    pub quantity: Value,
}

/// Item to delete.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteItemForm {
    pub id: ItemId,
}

/// Items keyed by list name, in list creation order.
#[derive(Debug)]
pub struct GroupedItems(ItemsByList);

impl Serialize for GroupedItems {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> std::result::Result<Se::Ok, Se::Error> {
        serializer.collect_map(self.0.iter().map(|(name, items)| (name, items)))
    }
}

/// Add items to one of the caller's lists.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<CreateItemsForm>,
) -> Result<Json<Value>> {
    ItemService::new(state.store())
        .add(&identity, &form.list_name, &form.item_list)
        .await?;

    Ok(message("New items added successfully!"))
}

/// Read items grouped by list name.
pub async fn read<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiQuery(query): ApiQuery<ReadItemsQuery>,
) -> Result<Json<GroupedItems>> {
    let grouped = ItemService::new(state.store())
        .read(&identity, query.list_name.as_deref())
        .await?;

    Ok(Json(GroupedItems(grouped)))
}

/// Overwrite an item's name and quantity.
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<UpdateItemForm>,
) -> Result<Json<Value>> {
    let input = ItemInput {
        name: form.item_name,
        quantity: form.quantity,
    };
    let update = ItemService::new(state.store())
        .update(&identity, form.id, &input)
        .await?;

    Ok(message(format!(
        "Item data successfully updated from {} -> {} and {} -> {}",
        update.before.name, update.after.name, update.before.quantity, update.after.quantity
    )))
}

/// Delete an item.
pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<DeleteItemForm>,
) -> Result<Json<Value>> {
    ItemService::new(state.store())
        .delete(&identity, form.id)
        .await?;

    Ok(message("Item successfully deleted!"))
}
