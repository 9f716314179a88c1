//! Account and user route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, message};
use crate::db::Store;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::{BasicCredentials, RequireUser};
use crate::models::Profile;
use crate::services::accounts::AccountService;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserForm {
    pub username: String,
    #[serde(alias = "e_mail")]
    pub email: String,
    pub password: String,
}

/// Forgot-password form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordForm {
    pub username: String,
}

/// Reset-password form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

/// Profile form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
}

/// Password re-check for account deletion.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteAccountForm {
    pub password: String,
}

/// Handle registration.
pub async fn create_user<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(form): ApiJson<CreateUserForm>,
) -> Result<Json<Value>> {
    AuthService::new(state.store(), state.tokens())
        .register(&form.username, &form.email, &form.password)
        .await?;

    Ok(message("User created!"))
}

/// Exchange HTTP Basic credentials for a bearer token.
#[tracing::instrument(skip_all, fields(username = %credentials.username))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    credentials: BasicCredentials,
) -> Result<Json<Value>> {
    let (user, token) = AuthService::new(state.store(), state.tokens())
        .login(&credentials.username, &credentials.password)
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(json!({ "token": token })))
}

/// Mail a password-reset token to the named account.
pub async fn forgot_password<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(form): ApiJson<ForgotPasswordForm>,
) -> Result<Json<Value>> {
    AccountService::new(state.store(), state.tokens(), state.mailer())
        .send_reset_token(&form.username)
        .await?;

    Ok(message("Password reset token sent!"))
}

/// Set a new password for the token holder.
pub async fn reset_password<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<ResetPasswordForm>,
) -> Result<Json<Value>> {
    AuthService::new(state.store(), state.tokens())
        .reset_password(&identity, &form.new_password, &form.confirm_password)
        .await?;

    Ok(message("Password updated!"))
}

/// Read the caller's profile.
pub async fn get_profile<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
) -> Result<Json<Profile>> {
    let profile = AccountService::new(state.store(), state.tokens(), state.mailer())
        .profile(&identity)
        .await?;

    Ok(Json(profile))
}

/// Create or edit the caller's profile.
pub async fn edit_profile<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<ProfileForm>,
) -> Result<Json<Profile>> {
    let profile = AccountService::new(state.store(), state.tokens(), state.mailer())
        .edit_profile(&identity, &form.first_name, &form.last_name)
        .await?;

    Ok(Json(profile))
}

/// Delete the caller's account and everything it owns.
pub async fn delete_account<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(identity): RequireUser,
    ApiJson(form): ApiJson<DeleteAccountForm>,
) -> Result<Json<Value>> {
    AccountService::new(state.store(), state.tokens(), state.mailer())
        .delete_account(&identity, &form.password)
        .await?;

    add_breadcrumb("account", "Account deleted", None);
    Ok(message("User deleted!"))
}
