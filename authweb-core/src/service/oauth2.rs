//! `OAuth2` sign-in service
//!
//! Front door for the HTTP layer: builds the authorization redirect, runs
//! the callback, and loads the signed-in user's profile. Tokens live only
//! in the caller's [`Session`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use super::callback::{CallbackOrchestrator, CallbackOutcome, CallbackParams};
use crate::config::OAuth2Config;
use crate::oauth2::{
    ProviderConfig, ProviderKind, Session, SessionTokenStore, TokenExchange, TokenExchanger,
    UserProfile, UserProfileFetcher,
};
use crate::Result;

#[derive(Debug, Clone)]
pub struct OAuth2Service {
    provider: Arc<ProviderConfig>,
    callback: CallbackOrchestrator,
    profiles: UserProfileFetcher,
    profile_timeout: Duration,
}

impl OAuth2Service {
    #[must_use]
    pub fn new(
        provider: Arc<ProviderConfig>,
        exchanger: Arc<dyn TokenExchange>,
        profiles: UserProfileFetcher,
        exchange_timeout: Duration,
        profile_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            callback: CallbackOrchestrator::new(exchanger, exchange_timeout),
            profiles,
            profile_timeout,
        }
    }

    /// Wire the reqwest-backed exchanger and fetcher for `provider`.
    #[must_use]
    pub fn from_config(
        provider: Arc<ProviderConfig>,
        config: &OAuth2Config,
        http_client: reqwest::Client,
    ) -> Self {
        let exchanger = TokenExchanger::new(Arc::clone(&provider), http_client.clone());
        let profiles = UserProfileFetcher::new(Arc::clone(&provider), http_client);
        Self::new(
            provider,
            Arc::new(exchanger),
            profiles,
            config.exchange_timeout(),
            config.profile_timeout(),
        )
    }

    #[must_use]
    pub fn provider_kind(&self) -> ProviderKind {
        self.provider.kind
    }

    /// Where to send the user agent to start signing in
    pub fn authorization_url(&self) -> Result<Url> {
        self.provider.authorization_url()
    }

    pub async fn handle_callback(
        &self,
        params: &CallbackParams,
        session: &mut Session,
        cancel: &CancellationToken,
    ) -> CallbackOutcome {
        self.callback.handle_callback(params, session, cancel).await
    }

    /// Profile of the user whose token is in `session`.
    ///
    /// # Errors
    /// A session error when no usable token is stored; otherwise whatever the
    /// profile request failed with.
    pub async fn current_profile(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<UserProfile> {
        let token = SessionTokenStore::load(session)?;
        debug!(expiry = ?token.expiry, "Loaded token from session");
        self.profiles
            .fetch_profile(&token, self.profile_timeout, cancel)
            .await
    }

    #[must_use]
    pub fn is_signed_in(&self, session: &Session) -> bool {
        SessionTokenStore::has_token(session)
    }

    pub fn sign_out(&self, session: &mut Session) {
        SessionTokenStore::clear(session);
    }
}
