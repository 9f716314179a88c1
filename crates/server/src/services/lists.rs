//! Shopping list operations.

use shoplist_core::ListName;

use super::ServiceError;
use super::auth::confirm_password;
use super::items::{ItemInput, validate_batch};
use crate::db::{RepositoryError, Store};
use crate::models::{Identity, Item, ShoppingList};

/// Shopping list service.
pub struct ListService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> ListService<'a, S> {
    /// Create a new list service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create a list, optionally with an initial batch of items.
    ///
    /// All items are validated before anything is written, and the list and
    /// its items are stored atomically.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a short list name or any invalid item,
    /// and `ServiceError::Conflict` if the caller already has a list with this
    /// name.
    pub async fn create(
        &self,
        owner: &Identity,
        name: &str,
        inputs: &[ItemInput],
    ) -> Result<(ShoppingList, Vec<Item>), ServiceError> {
        let name = ListName::parse(name)?;
        let items = validate_batch(inputs)?;

        let (list, items) = self
            .store
            .create_list(owner.user_id, &name, &items)
            .await
            .map_err(list_name_taken)?;

        tracing::info!(
            user_id = %owner.user_id,
            list_id = %list.id,
            items = items.len(),
            "Shopping list created"
        );
        Ok((list, items))
    }

    /// Rename one of the caller's lists.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if `old_name` is not one of the caller's
    /// lists, a validation error for a short `new_name`, and
    /// `ServiceError::Conflict` if `new_name` is already in use by the caller.
    pub async fn rename(
        &self,
        owner: &Identity,
        old_name: &str,
        new_name: &str,
    ) -> Result<ShoppingList, ServiceError> {
        let list = self.find(owner, old_name).await?;
        let new_name = ListName::parse(new_name)?;

        let renamed = self
            .store
            .rename_list(owner.user_id, list.id, &new_name)
            .await
            .map_err(list_name_taken)?;

        tracing::info!(user_id = %owner.user_id, list_id = %list.id, "Shopping list renamed");
        Ok(renamed)
    }

    /// Delete one of the caller's lists and its items after re-checking the
    /// caller's password.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the list is absent and
    /// `ServiceError::Auth` if the password does not match.
    pub async fn delete(
        &self,
        owner: &Identity,
        name: &str,
        password: &str,
    ) -> Result<(), ServiceError> {
        let list = self.find(owner, name).await?;
        confirm_password(self.store, owner.user_id, password).await?;

        if !self.store.delete_list(owner.user_id, list.id).await? {
            return Err(list_not_found());
        }

        tracing::info!(user_id = %owner.user_id, list_id = %list.id, "Shopping list deleted");
        Ok(())
    }

    /// Names of the caller's lists in creation order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the caller has no lists.
    pub async fn names(&self, owner: &Identity) -> Result<Vec<String>, ServiceError> {
        let lists = self.store.lists_for(owner.user_id).await?;
        if lists.is_empty() {
            return Err(ServiceError::NotFound(
                "No shopping lists on this user!".to_owned(),
            ));
        }
        Ok(lists.into_iter().map(|l| l.name).collect())
    }

    async fn find(&self, owner: &Identity, name: &str) -> Result<ShoppingList, ServiceError> {
        self.store
            .find_list(owner.user_id, name)
            .await?
            .ok_or_else(list_not_found)
    }
}

fn list_not_found() -> ServiceError {
    ServiceError::NotFound("List name does not exist!".to_owned())
}

fn list_name_taken(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(_) => ServiceError::Conflict("List name already taken!".to_owned()),
        other => other.into(),
    }
}
