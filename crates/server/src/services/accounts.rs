//! Account operations beyond login: profiles, deletion and reset mail.

use shoplist_core::PersonName;

use super::ServiceError;
use super::auth::{AuthService, TokenAuthority, confirm_password};
use super::email::Mailer;
use crate::db::Store;
use crate::models::{Identity, Profile, ProfileUpdate};

const RESET_SUBJECT: &str = "Shoplist password reset";

/// Account service.
pub struct AccountService<'a, S> {
    store: &'a S,
    tokens: &'a TokenAuthority,
    mailer: &'a Mailer,
}

impl<'a, S: Store> AccountService<'a, S> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a S, tokens: &'a TokenAuthority, mailer: &'a Mailer) -> Self {
        Self {
            store,
            tokens,
            mailer,
        }
    }

    /// Get the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the profile was never created.
    pub async fn profile(&self, owner: &Identity) -> Result<Profile, ServiceError> {
        self.store
            .get_profile(owner.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile does not exist!".to_owned()))
    }

    /// Set the caller's display names, creating the profile on first use.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Name` if either name is invalid.
    pub async fn edit_profile(
        &self,
        owner: &Identity,
        first_name: &str,
        last_name: &str,
    ) -> Result<Profile, ServiceError> {
        let update = ProfileUpdate {
            first_name: PersonName::parse("First", first_name)?,
            last_name: PersonName::parse("Last", last_name)?,
        };

        let profile = self.store.upsert_profile(owner.user_id, &update).await?;
        tracing::info!(user_id = %owner.user_id, "Profile updated");
        Ok(profile)
    }

    /// Delete the caller's account and everything it owns after re-checking
    /// the password.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Auth` if the password does not match.
    pub async fn delete_account(&self, owner: &Identity, password: &str) -> Result<(), ServiceError> {
        confirm_password(self.store, owner.user_id, password).await?;

        if !self.store.delete_user(owner.user_id).await? {
            return Err(ServiceError::NotFound("User does not exist!".to_owned()));
        }
        tracing::info!(user_id = %owner.user_id, "Account deleted");
        Ok(())
    }

    /// Email a fresh token to the named account so its owner can reset the
    /// password.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Auth` for an unknown username and
    /// `ServiceError::Email` if the message cannot be sent.
    pub async fn send_reset_token(&self, username: &str) -> Result<(), ServiceError> {
        let (user, token) = AuthService::new(self.store, self.tokens)
            .issue_reset_token(username)
            .await?;

        let body = format!(
            "Hello {},\n\nUse the token below to reset your password. It expires in {} minutes.\n\n{token}\n",
            user.username,
            self.tokens.ttl().num_minutes()
        );
        self.mailer
            .send(
                RESET_SUBJECT,
                self.mailer.from_address(),
                &[user.email.as_str()],
                &body,
            )
            .await
            .inspect_err(|e| tracing::error!(user_id = %user.id, error = %e, "Reset email failed"))?;

        tracing::info!(user_id = %user.id, "Password reset token sent");
        Ok(())
    }
}
