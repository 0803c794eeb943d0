//! Sign-in, sign-up and account maintenance.

use crate::api::jwt::decode_claims;
use crate::api::payloads::ProfileUpdate;
use crate::api::SchedulerClient;
use crate::error::{ClientError, ClientResult};
use crate::models::user::{TokenPatch, Tokens, UserProfile};
use crate::store::Action;
use serde_json::Value;

/// Exchange credentials for tokens and load the user's profile.
///
/// A rejected login clears any previous session. A profile that fails to
/// load leaves the new tokens in place.
pub async fn login(
    client: &SchedulerClient,
    username: &str,
    password: &str,
) -> ClientResult<UserProfile> {
    let tokens = match client.obtain_token(username, password).await {
        Ok(tokens) => tokens,
        Err(e) => {
            client.store().dispatch(Action::ClearUserState);
            return Err(e);
        }
    };
    let Tokens { access, refresh } = tokens;
    let Some(access) = access else {
        client.store().dispatch(Action::ClearUserState);
        return Err(ClientError::Validation(
            "Token response carried no access token".into(),
        ));
    };

    client.store().dispatch(Action::SetUserTokens(TokenPatch {
        access: Some(access.clone()),
        refresh,
    }));
    log::info!("Signed in as {}", username);

    let user_id = decode_claims(&access)?
        .user_id
        .ok_or_else(|| ClientError::Validation("Access token has no user_id claim".into()))?;
    load_profile(client, user_id).await
}

/// Create an account, then sign in with it.
pub async fn signup(
    client: &SchedulerClient,
    username: &str,
    password: &str,
) -> ClientResult<UserProfile> {
    let created = client.create_user(username, password).await?;
    log::info!("Created account {}", created.username);
    login(client, username, password).await
}

/// End the session. Local state is cleared even when the backend call fails.
pub async fn logout(client: &SchedulerClient) {
    if client.store().access_token().is_some() {
        if let Err(e) = client.invalidate_token().await {
            log::warn!("Failed to invalidate tokens on the server: {}", e);
        }
    }
    client.store().dispatch(Action::ClearUserState);
    log::info!("Signed out");
}

async fn load_profile(client: &SchedulerClient, user_id: i64) -> ClientResult<UserProfile> {
    let profile = client.get_user(user_id).await?;
    client
        .store()
        .dispatch(Action::SetUserProfile(Some(profile.clone())));
    Ok(profile)
}

/// Id of the signed-in user, from the stored profile or the access token.
pub fn current_user_id(client: &SchedulerClient) -> ClientResult<i64> {
    if let Some(id) = client.store().read(|s| s.user.profile.as_ref().map(|p| p.id)) {
        return Ok(id);
    }
    let access = client.store().access_token().ok_or(ClientError::NotLoggedIn)?;
    decode_claims(&access)?.user_id.ok_or(ClientError::NotLoggedIn)
}

pub async fn reload_profile(client: &SchedulerClient) -> ClientResult<UserProfile> {
    let user_id = current_user_id(client)?;
    load_profile(client, user_id).await
}

pub async fn update_profile(
    client: &SchedulerClient,
    update: &ProfileUpdate,
) -> ClientResult<UserProfile> {
    if update.password.is_some() && update.old_password.is_none() {
        return Err(ClientError::Validation(
            "Changing the password requires the current password".into(),
        ));
    }
    let user_id = current_user_id(client)?;
    let profile = client.update_user(user_id, update).await?;
    client
        .store()
        .dispatch(Action::SetUserProfile(Some(profile.clone())));
    Ok(profile)
}

pub async fn request_email_token(client: &SchedulerClient) -> ClientResult<Value> {
    if client.store().access_token().is_none() {
        return Err(ClientError::NotLoggedIn);
    }
    client.request_email_token().await
}

/// Confirm an email address with the token from the verification link.
pub async fn verify_email(client: &SchedulerClient, link_token: &str) -> ClientResult<Value> {
    let response = client.verify_email(link_token).await?;
    if client.store().access_token().is_some() {
        if let Err(e) = reload_profile(client).await {
            log::warn!("Email verified but the profile could not be reloaded: {}", e);
        }
    }
    Ok(response)
}

pub async fn forget_password(client: &SchedulerClient, email: &str) -> ClientResult<Value> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ClientError::Validation("Email is required".into()));
    }
    client.forget_password(email).await
}

/// Set a new password with the token from the reset link.
pub async fn reset_password(
    client: &SchedulerClient,
    link_token: &str,
    password: &str,
    confirmation: &str,
) -> ClientResult<Value> {
    if password != confirmation {
        return Err(ClientError::Validation("Passwords do not match".into()));
    }
    client.reset_password(link_token, password).await
}
