//! Authenticated user profile retrieval

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::providers::{GoogleProfile, MicrosoftProfile, OidcProfile, ProviderKind};
use super::transport::{bounded, decode_json};
use super::{ProviderConfig, TokenEntity};
use crate::Result;

/// Profile of the signed-in user, one shape per provider kind.
///
/// The variant always follows the configured provider, never the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", content = "profile", rename_all = "lowercase")]
pub enum UserProfile {
    Google(GoogleProfile),
    Microsoft(MicrosoftProfile),
    Oidc(OidcProfile),
}

impl UserProfile {
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::Google(_) => ProviderKind::Google,
            Self::Microsoft(_) => ProviderKind::Microsoft,
            Self::Oidc(_) => ProviderKind::Oidc,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Google(p) => p.name.as_deref(),
            Self::Microsoft(p) => p.display_name.as_deref(),
            Self::Oidc(p) => p.name.as_deref(),
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Google(p) => p.email.as_deref(),
            Self::Microsoft(p) => p.mail.as_deref().or(p.user_principal_name.as_deref()),
            Self::Oidc(p) => p.email.as_deref(),
        }
    }

    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        match self {
            Self::Google(p) => p.locale.as_deref(),
            Self::Microsoft(p) => p.preferred_language.as_deref(),
            Self::Oidc(p) => p.locale.as_deref(),
        }
    }
}

/// Profile endpoint client for the configured provider
#[derive(Debug, Clone)]
pub struct UserProfileFetcher {
    provider: Arc<ProviderConfig>,
    http_client: reqwest::Client,
}

impl UserProfileFetcher {
    #[must_use]
    pub const fn new(provider: Arc<ProviderConfig>, http_client: reqwest::Client) -> Self {
        Self {
            provider,
            http_client,
        }
    }

    /// Fetch the profile of the user `token` belongs to.
    ///
    /// No retry, no caching, and no expiry check: an expired token is
    /// reported by the provider as a non-2xx status.
    pub async fn fetch_profile(
        &self,
        token: &TokenEntity,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<UserProfile> {
        bounded(self.request_profile(token), timeout, cancel).await
    }

    async fn request_profile(&self, token: &TokenEntity) -> Result<UserProfile> {
        debug!(
            provider = %self.provider.kind,
            profile_url = %self.provider.profile_url,
            "Fetching user profile"
        );

        let response = self
            .http_client
            .get(self.provider.profile_url.clone())
            .header(AUTHORIZATION, token.authorization_header())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let profile = match self.provider.kind {
            ProviderKind::Google => UserProfile::Google(decode_json(response).await?),
            ProviderKind::Microsoft => UserProfile::Microsoft(decode_json(response).await?),
            ProviderKind::Oidc => UserProfile::Oidc(decode_json(response).await?),
        };

        Ok(profile)
    }
}
