//! Shopping list route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, message};
use crate::db::Store;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::services::items::ItemInput;
use crate::services::lists::ListService;
use crate::state::AppState;

/// New list with an optional first batch of items.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListForm {
    pub list_name: String,
    #[serde(default)]
    pub item_list: Vec<ItemInput>,
}

/// Rename request.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameListForm {
    pub old_name: String,
    pub new_name: String,
}

/// Delete request; the password is checked again.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteListForm {
    pub list_name: String,
    pub user_password: String,
}

/// Names of the caller's lists.
pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
) -> Result<Json<Value>> {
    let names = ListService::new(state.store()).names(&identity).await?;
    Ok(Json(json!({ "all_lists": names })))
}

/// Create a list.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<CreateListForm>,
) -> Result<Json<Value>> {
    ListService::new(state.store())
        .create(&identity, &form.list_name, &form.item_list)
        .await?;

    Ok(message("Shopping list added successfully!"))
}

/// Rename a list.
pub async fn rename<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<RenameListForm>,
) -> Result<Json<Value>> {
    ListService::new(state.store())
        .rename(&identity, &form.old_name, &form.new_name)
        .await?;

    Ok(message("Shopping list name updated!"))
}

/// Delete a list and its items.
pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<DeleteListForm>,
) -> Result<Json<Value>> {
    ListService::new(state.store())
        .delete(&identity, &form.list_name, &form.user_password)
        .await?;

    add_breadcrumb(
        "lists",
        "Shopping list deleted",
        Some(&[("list_name", form.list_name.as_str())]),
    );
    Ok(message("Shopping list successfully deleted!"))
}
