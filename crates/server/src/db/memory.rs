//! In-process implementation of the repository traits.
//!
//! Mirrors the `PostgreSQL` schema's constraints: unique usernames and emails,
//! unique list names per owner, serial ids and cascading deletes. Used by the
//! test suites, which can also pin the clock that stamps `created_at`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use shoplist_core::{ItemId, ListId, ListName, PublicId, UserId};

use super::{ItemStore, ListStore, RepositoryError, Store, UserStore};
use crate::models::{Item, NewItem, NewUser, Profile, ProfileUpdate, ShoppingList, User};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Tables {
    next_user: i32,
    next_list: i32,
    next_item: i32,
    users: BTreeMap<UserId, StoredUser>,
    profiles: BTreeMap<UserId, Profile>,
    lists: BTreeMap<ListId, ShoppingList>,
    items: BTreeMap<ItemId, Item>,
}

impl Tables {
    fn user_by_name(&self, username: &str) -> Option<&StoredUser> {
        self.users.values().find(|s| s.user.username == username)
    }

    fn list_named(&self, owner: UserId, name: &str) -> Option<&ShoppingList> {
        self.lists
            .values()
            .find(|l| l.user_id == owner && l.name == name)
    }

    fn insert_items(&mut self, list: ListId, items: &[NewItem], now: DateTime<Utc>) -> Vec<Item> {
        items
            .iter()
            .map(|new| {
                self.next_item += 1;
                let item = Item {
                    id: ItemId::new(self.next_item),
                    list_id: list,
                    name: new.name.as_str().to_owned(),
                    quantity: new.quantity,
                    created_at: now,
                    updated_at: now,
                };
                self.items.insert(item.id, item.clone());
                item
            })
            .collect()
    }

    fn drop_list(&mut self, id: ListId) {
        self.lists.remove(&id);
        self.items.retain(|_, item| item.list_id != id);
    }
}

/// Repository backed by in-memory maps behind a single lock.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    clock: Clock,
}

impl MemoryStore {
    /// Create an empty store stamping rows with the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Create an empty store stamping rows with `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            clock: Arc::new(clock),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

// =============================================================================
// Users
// =============================================================================

impl UserStore for MemoryStore {
    async fn create_user(&self, new: &NewUser) -> Result<User, RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;

        if t.user_by_name(new.username.as_str()).is_some() {
            return Err(RepositoryError::Conflict("Username already taken!".to_owned()));
        }
        if t.users.values().any(|s| s.user.email == new.email) {
            return Err(RepositoryError::Conflict("E-mail already taken!".to_owned()));
        }

        t.next_user += 1;
        let user = User {
            id: UserId::new(t.next_user),
            public_id: new.public_id,
            username: new.username.as_str().to_owned(),
            email: new.email.clone(),
            created_at: now,
            updated_at: now,
        };
        t.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn get_by_public_id(&self, public_id: PublicId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t
            .users
            .values()
            .find(|s| s.user.public_id == public_id)
            .map(|s| s.user.clone()))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.user_by_name(username).map(|s| s.user.clone()))
    }

    async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t
            .user_by_name(username)
            .map(|s| (s.user.clone(), s.password_hash.clone())))
    }

    async fn get_password_hash_by_id(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).map(|s| s.password_hash.clone()))
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;
        let stored = t.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut stored.password_hash);
        stored.user.updated_at = now;
        Ok(())
    }

    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.profiles.get(&id).cloned())
    }

    async fn upsert_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }

        let profile = t.profiles.entry(id).or_insert_with(|| Profile {
            user_id: id,
            first_name: String::new(),
            last_name: String::new(),
            created_at: now,
            updated_at: now,
        });
        update.first_name.as_str().clone_into(&mut profile.first_name);
        update.last_name.as_str().clone_into(&mut profile.last_name);
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.profiles.remove(&id);

        let owned: Vec<ListId> = t
            .lists
            .values()
            .filter(|l| l.user_id == id)
            .map(|l| l.id)
            .collect();
        for list in owned {
            t.drop_list(list);
        }
        Ok(true)
    }
}

// =============================================================================
// Lists
// =============================================================================

impl ListStore for MemoryStore {
    async fn create_list(
        &self,
        owner: UserId,
        name: &ListName,
        items: &[NewItem],
    ) -> Result<(ShoppingList, Vec<Item>), RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;

        if !t.users.contains_key(&owner) {
            return Err(RepositoryError::NotFound);
        }
        if t.list_named(owner, name.as_str()).is_some() {
            return Err(RepositoryError::Conflict("List name already exists!".to_owned()));
        }

        t.next_list += 1;
        let list = ShoppingList {
            id: ListId::new(t.next_list),
            user_id: owner,
            name: name.as_str().to_owned(),
            created_at: now,
            updated_at: now,
        };
        t.lists.insert(list.id, list.clone());
        let inserted = t.insert_items(list.id, items, now);
        Ok((list, inserted))
    }

    async fn find_list(
        &self,
        owner: UserId,
        name: &str,
    ) -> Result<Option<ShoppingList>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.list_named(owner, name).cloned())
    }

    async fn lists_for(&self, owner: UserId) -> Result<Vec<ShoppingList>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut lists: Vec<ShoppingList> = t
            .lists
            .values()
            .filter(|l| l.user_id == owner)
            .cloned()
            .collect();
        lists.sort_by_key(|l| (l.created_at, l.id));
        Ok(lists)
    }

    async fn rename_list(
        &self,
        owner: UserId,
        id: ListId,
        new_name: &ListName,
    ) -> Result<ShoppingList, RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;

        if t
            .list_named(owner, new_name.as_str())
            .is_some_and(|other| other.id != id)
        {
            return Err(RepositoryError::Conflict("List name already exists!".to_owned()));
        }

        let list = t
            .lists
            .get_mut(&id)
            .filter(|l| l.user_id == owner)
            .ok_or(RepositoryError::NotFound)?;
        new_name.as_str().clone_into(&mut list.name);
        list.updated_at = now;
        Ok(list.clone())
    }

    async fn delete_list(&self, owner: UserId, id: ListId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.lists.get(&id).is_some_and(|l| l.user_id == owner) {
            return Ok(false);
        }
        t.drop_list(id);
        Ok(true)
    }
}

// =============================================================================
// Items
// =============================================================================

impl ItemStore for MemoryStore {
    async fn add_items(&self, list: ListId, items: &[NewItem]) -> Result<Vec<Item>, RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;
        if !t.lists.contains_key(&list) {
            return Err(RepositoryError::NotFound);
        }
        Ok(t.insert_items(list, items, now))
    }

    async fn items_in_list(&self, list: ListId) -> Result<Vec<Item>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut items: Vec<Item> = t
            .items
            .values()
            .filter(|i| i.list_id == list)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.created_at, i.id));
        Ok(items)
    }

    async fn items_created_between(
        &self,
        list: ListId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Item>, RepositoryError> {
        let mut items = self.items_in_list(list).await?;
        items.retain(|i| start < i.created_at && i.created_at < end);
        Ok(items)
    }

    async fn find_item(&self, list: ListId, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.items.get(&id).filter(|i| i.list_id == list).cloned())
    }

    async fn update_item(
        &self,
        list: ListId,
        id: ItemId,
        update: &NewItem,
    ) -> Result<Item, RepositoryError> {
        let now = self.now();
        let mut t = self.tables.lock().await;
        let item = t
            .items
            .get_mut(&id)
            .filter(|i| i.list_id == list)
            .ok_or(RepositoryError::NotFound)?;
        update.name.as_str().clone_into(&mut item.name);
        item.quantity = update.quantity;
        item.updated_at = now;
        Ok(item.clone())
    }

    async fn delete_item(&self, list: ListId, id: ItemId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.items.get(&id).is_some_and(|i| i.list_id == list) {
            return Ok(false);
        }
        t.items.remove(&id);
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shoplist_core::{Email, ItemName, Quantity, Username};

    use super::*;

    async fn seed_user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(&NewUser {
                public_id: PublicId::generate(),
                username: Username::parse(name).unwrap(),
                email: Email::parse(&format!("{name}@example.com")).unwrap(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
    }

    fn new_item(name: &str, quantity: i64) -> NewItem {
        NewItem {
            name: ItemName::parse(name).unwrap(),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        seed_user(&store, "shopper1").await;

        let err = store
            .create_user(&NewUser {
                public_id: PublicId::generate(),
                username: Username::parse("shopper1").unwrap(),
                email: Email::parse("other@example.com").unwrap(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(msg) if msg == "Username already taken!"));
    }

    #[tokio::test]
    async fn test_list_names_are_unique_per_owner_only() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice_1").await;
        let bob = seed_user(&store, "bob_one").await;
        let name = ListName::parse("Groceries").unwrap();

        store.create_list(alice.id, &name, &[]).await.unwrap();
        store.create_list(bob.id, &name, &[]).await.unwrap();
        let err = store.create_list(alice.id, &name, &[]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice_1").await;
        let name = ListName::parse("Groceries").unwrap();
        let (list, _) = store.create_list(alice.id, &name, &[]).await.unwrap();

        let renamed = store.rename_list(alice.id, list.id, &name).await.unwrap();
        assert_eq!(renamed.name, "Groceries");
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice_1").await;
        let (list, items) = store
            .create_list(
                alice.id,
                &ListName::parse("Groceries").unwrap(),
                &[new_item("Apples", 3)],
            )
            .await
            .unwrap();

        assert!(store.delete_user(alice.id).await.unwrap());
        assert!(store.lists_for(alice.id).await.unwrap().is_empty());
        assert!(store.find_item(list.id, items[0].id).await.unwrap().is_none());
        assert!(!store.delete_user(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_item_operations_are_scoped_by_list() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice_1").await;
        let (first, items) = store
            .create_list(
                alice.id,
                &ListName::parse("First").unwrap(),
                &[new_item("Apples", 3)],
            )
            .await
            .unwrap();
        let (second, _) = store
            .create_list(alice.id, &ListName::parse("Second").unwrap(), &[])
            .await
            .unwrap();
        let item = items[0].id;

        assert!(store.find_item(second.id, item).await.unwrap().is_none());
        assert!(!store.delete_item(second.id, item).await.unwrap());
        assert!(store.find_item(first.id, item).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_items_created_between_is_exclusive() {
        let start = DateTime::parse_from_rfc3339("2021-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let store = MemoryStore::with_clock(move || start);
        let alice = seed_user(&store, "alice_1").await;
        let (list, _) = store
            .create_list(
                alice.id,
                &ListName::parse("Groceries").unwrap(),
                &[new_item("Apples", 3)],
            )
            .await
            .unwrap();

        let end = start + chrono::TimeDelta::days(1);
        assert!(store
            .items_created_between(list.id, start, end)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .items_created_between(list.id, start - chrono::TimeDelta::days(1), end)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
