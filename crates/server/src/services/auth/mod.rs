//! Authentication service.
//!
//! Provides password accounts, bearer-token login and token resolution.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenAuthority};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use shoplist_core::{Email, PublicId, UserId, Username};

use crate::db::{RepositoryError, UserStore};
use crate::models::{Identity, NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles registration, login, password changes and resolving bearer tokens
/// to the identity every protected operation is scoped by.
pub struct AuthService<'a, S> {
    users: &'a S,
    tokens: &'a TokenAuthority,
}

impl<'a, S: UserStore> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a S, tokens: &'a TokenAuthority) -> Self {
        Self { users, tokens }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword`, `AuthError::InvalidUsername` or
    /// `AuthError::InvalidEmail` if the input breaks the account rules.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        // Validate
        validate_password(password)?;
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_user(&NewUser {
                public_id: PublicId::generate(),
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(field) => AuthError::UserAlreadyExists(field),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Login with username and password, returning a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(user.public_id)?;
        Ok((user, token))
    }

    /// Replace the caller's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs and
    /// `AuthError::WeakPassword` if the new password is too short.
    pub async fn reset_password(
        &self,
        identity: &Identity,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password(identity.user_id, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UnknownSubject,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %identity.user_id, "Password reset");
        Ok(())
    }

    /// Issue a token for the named account, for out-of-band delivery.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownUser` if no account has that username.
    pub async fn issue_reset_token(&self, username: &str) -> Result<(User, String), AuthError> {
        let user = self
            .users
            .get_by_username(username)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        let token = self.tokens.issue(user.public_id)?;
        Ok((user, token))
    }

    // =========================================================================
    // Token Resolution
    // =========================================================================

    /// Verify a bearer token and resolve it to the account it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` for malformed, forged or expired tokens and
    /// `AuthError::UnknownSubject` if the account no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.verify(token)?;

        let user = self
            .users
            .get_by_public_id(claims.public_id)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(Identity::from(&user))
    }
}

/// Check a password against the stored hash of an authenticated user.
///
/// Destructive operations call this on top of token authentication.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or if the user is gone.
pub async fn confirm_password<S: UserStore>(
    users: &S,
    user: UserId,
    password: &str,
) -> Result<(), AuthError> {
    let password_hash = users
        .get_password_hash_by_id(user)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    verify_password(password, &password_hash)
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword("Password is too short!".to_owned()));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparsable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn tokens() -> TokenAuthority {
        TokenAuthority::new(
            SecretString::from("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6"),
            TimeDelta::minutes(90),
        )
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_register_login_authenticate() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        let user = auth
            .register("shopper1", "shopper@example.com", "hunter2hunter2")
            .await
            .unwrap();
        let (_, token) = auth.login("shopper1", "hunter2hunter2").await.unwrap();
        let identity = auth.authenticate(&token).await.unwrap();

        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.public_id, user.public_id);
    }

    #[tokio::test]
    async fn test_register_rules() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        assert!(matches!(
            auth.register("shopper1", "shopper@example.com", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register("shop", "shopper@example.com", "long enough").await,
            Err(AuthError::InvalidUsername(_))
        ));
        assert!(matches!(
            auth.register("shopper1", "not-an-email", "long enough").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);

        auth.register("shopper1", "shopper@example.com", "long enough")
            .await
            .unwrap();
        let err = auth
            .register("shopper2", "shopper@example.com", "long enough")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists(field) if field == "E-mail already taken!"));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        auth.register("shopper1", "shopper@example.com", "long enough")
            .await
            .unwrap();

        assert!(matches!(
            auth.login("shopper1", "wrong password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody_here", "long enough").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_unknown_subject() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth
            .register("shopper1", "shopper@example.com", "long enough")
            .await
            .unwrap();
        let (_, token) = auth.login("shopper1", "long enough").await.unwrap();

        store.delete_user(user.id).await.unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::UnknownSubject)
        ));
    }

    #[tokio::test]
    async fn test_confirm_password() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let user = AuthService::new(&store, &tokens)
            .register("shopper1", "shopper@example.com", "long enough")
            .await
            .unwrap();

        assert!(confirm_password(&store, user.id, "long enough").await.is_ok());
        assert!(matches!(
            confirm_password(&store, user.id, "not it at all").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_reset_password() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens);
        let user = auth
            .register("shopper1", "shopper@example.com", "long enough")
            .await
            .unwrap();
        let identity = Identity::from(&user);

        assert!(matches!(
            auth.reset_password(&identity, "new password", "other password")
                .await,
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            auth.reset_password(&identity, "short", "short").await,
            Err(AuthError::WeakPassword(_))
        ));

        auth.reset_password(&identity, "new password", "new password")
            .await
            .unwrap();
        assert!(auth.login("shopper1", "long enough").await.is_err());
        assert!(auth.login("shopper1", "new password").await.is_ok());
    }
}
