//! Core types for Shoplist.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod granularity;
pub mod id;
pub mod name;
pub mod quantity;

pub use email::{Email, EmailError};
pub use granularity::{Granularity, GranularityError};
pub use id::*;
pub use name::{
    FORBIDDEN_CHARACTERS, ItemName, ListName, NameError, PersonName, Username, UsernameError,
};
pub use quantity::{Quantity, QuantityError};
