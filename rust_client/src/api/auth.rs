//! Bearer token attachment and transparent access-token refresh.
//!
//! Session requests carry the stored access token. When such a request comes
//! back `401`, [`AuthInterceptor::on_unauthorized`] decides whether the token
//! is the problem:
//!
//! 1. a token whose claims cannot be decoded is left alone;
//! 2. an expired token goes straight to refresh;
//! 3. otherwise the backend is asked to verify it, and a token it accepts
//!    means the 401 was about something else;
//! 4. refresh exchanges the refresh token for a new access token, after
//!    which the caller retries once. A failed refresh ends the session.
//!
//! Concurrent 401s for the same token share a single refresh.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::jwt::decode_claims;
use super::request::AuthMode;
use crate::error::{ClientError, ClientResult};
use crate::models::user::TokenPatch;
use crate::store::{Action, StoreHandle};

/// Token endpoints the interceptor needs; calls must not be intercepted.
#[async_trait]
pub trait TokenEndpoints: Send + Sync {
    /// `Ok` when the backend accepts `token`.
    async fn verify_token(&self, token: &str) -> ClientResult<()>;

    async fn refresh_token(&self, refresh: &str) -> ClientResult<TokenPatch>;
}

/// What to do with a 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthorized {
    /// Return the 401 to the caller
    PassThrough,
    /// Tokens were renewed; send the request again
    Retry,
}

pub struct AuthInterceptor {
    store: StoreHandle,
    refresh_lock: Mutex<()>,
}

impl AuthInterceptor {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Bearer token to send with a request in `mode`.
    pub fn token_for(&self, mode: &AuthMode) -> Option<String> {
        match mode {
            AuthMode::Session => self.store.access_token(),
            AuthMode::Anonymous => None,
            AuthMode::Token(token) => Some(token.clone()),
        }
    }

    /// Handle a 401 to a session request that was sent with `sent_token`.
    pub async fn on_unauthorized(
        &self,
        endpoints: &dyn TokenEndpoints,
        sent_token: &str,
        now: DateTime<Utc>,
    ) -> Unauthorized {
        let claims = match decode_claims(sent_token) {
            Ok(claims) if claims.exp.is_some() => claims,
            _ => {
                log::debug!("401 with an undecodable token, not refreshing");
                return Unauthorized::PassThrough;
            }
        };

        let _guard = self.refresh_lock.lock().await;

        // Someone else already dealt with this token while we waited.
        match self.store.access_token() {
            Some(current) if current != sent_token => return Unauthorized::Retry,
            None => return Unauthorized::PassThrough,
            Some(_) => {}
        }

        if !claims.is_expired(now) {
            match endpoints.verify_token(sent_token).await {
                Ok(()) => {
                    log::debug!("Access token still valid, 401 is not an auth failure");
                    return Unauthorized::PassThrough;
                }
                Err(e) => log::debug!("Access token rejected: {}", e),
            }
        }

        self.refresh(endpoints).await
    }

    async fn refresh(&self, endpoints: &dyn TokenEndpoints) -> Unauthorized {
        let refreshed = match self.store.refresh_token() {
            Some(refresh) => endpoints.refresh_token(&refresh).await,
            None => Err(ClientError::NotLoggedIn),
        };
        match refreshed {
            Ok(patch) if patch.access.is_some() => {
                log::info!("Access token refreshed");
                self.store.dispatch(Action::SetUserTokens(patch));
                Unauthorized::Retry
            }
            Ok(_) => {
                log::warn!("Refresh response carried no access token, signing out");
                self.store.dispatch(Action::ClearUserState);
                Unauthorized::PassThrough
            }
            Err(e) => {
                log::warn!("Token refresh failed, signing out: {}", e);
                self.store.dispatch(Action::ClearUserState);
                Unauthorized::PassThrough
            }
        }
    }
}
