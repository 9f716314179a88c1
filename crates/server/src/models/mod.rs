//! Domain models for Shoplist.
//!
//! These are plain data carriers. Persistence lives behind the repository
//! traits in [`crate::db`], so none of these types know how to save themselves.

pub mod list;
pub mod user;

pub use list::{Item, ItemUpdate, NewItem, ShoppingList};
pub use user::{Identity, NewUser, Profile, ProfileUpdate, User};
