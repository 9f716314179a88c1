//! Fixtures shared by unit tests.

#![allow(clippy::unwrap_used)]

use shoplist_core::{Email, PublicId, Username};

use crate::db::{MemoryStore, UserStore};
use crate::models::{Identity, NewUser};
use crate::services::auth::hash_password;

/// Password of every account created by [`seed_identity`].
pub const SEED_PASSWORD: &str = "correct horse";

/// Create an account named `username` and return its identity.
pub async fn seed_identity(store: &MemoryStore, username: &str) -> Identity {
    let user = store
        .create_user(&NewUser {
            public_id: PublicId::generate(),
            username: Username::parse(username).unwrap(),
            email: Email::parse(&format!("{username}@example.com")).unwrap(),
            password_hash: hash_password(SEED_PASSWORD).unwrap(),
        })
        .await
        .unwrap();
    Identity::from(&user)
}
