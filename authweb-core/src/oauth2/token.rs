//! Authorization code for token exchange

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use oauth2::{AccessToken, RefreshToken};
use serde::{Deserialize, Deserializer};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::transport::{bounded, decode_json};
use super::ProviderConfig;
use crate::{Error, Result};

/// Token material returned by the provider's token endpoint.
///
/// `expiry` is never read from the wire; it is derived from `expires_in`
/// at the moment the token is obtained (or reloaded).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntity {
    pub access_token: AccessToken,
    pub token_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,
    #[serde(skip)]
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenEntity {
    /// `now + expires_in`, or `None` when the provider gave no lifetime.
    #[must_use]
    pub fn expiry_from(expires_in: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if expires_in == 0 {
            return None;
        }
        TimeDelta::try_seconds(expires_in).and_then(|d| now.checked_add_signed(d))
    }

    /// Value for the `Authorization` header of resource requests
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.secret())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trades an authorization code for a token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange `code` for a token, giving up after `timeout` or when
    /// `cancel` fires. Never retries.
    async fn exchange_code(
        &self,
        code: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TokenEntity>;
}

/// Token endpoint client for the configured provider
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    provider: Arc<ProviderConfig>,
    http_client: reqwest::Client,
}

impl TokenExchanger {
    #[must_use]
    pub const fn new(provider: Arc<ProviderConfig>, http_client: reqwest::Client) -> Self {
        Self {
            provider,
            http_client,
        }
    }

    async fn request_token(&self, code: &str) -> Result<TokenEntity> {
        let provider = &self.provider;
        let form = [
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.secret().as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", provider.redirect_url.as_str()),
        ];

        debug!(
            provider = %provider.kind,
            token_url = %provider.token_url.as_str(),
            "Exchanging authorization code"
        );

        // Credentials go both in the body and as HTTP basic auth; providers
        // accept one or the other.
        let response = self
            .http_client
            .post(provider.token_url.url().clone())
            .basic_auth(
                escape(provider.client_id.as_str()),
                Some(escape(provider.client_secret.secret())),
            )
            .form(&form)
            .send()
            .await?;

        let mut token: TokenEntity = decode_json(response).await?;
        token.expiry = TokenEntity::expiry_from(token.expires_in, Utc::now());
        if token.expires_in != 0 && token.expiry.is_none() {
            return Err(Error::Decode(format!(
                "expires_in {} is out of range",
                token.expires_in
            )));
        }

        debug!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "Token exchange succeeded"
        );

        Ok(token)
    }
}

#[async_trait]
impl TokenExchange for TokenExchanger {
    async fn exchange_code(
        &self,
        code: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<TokenEntity> {
        if code.is_empty() {
            return Err(Error::MissingCode);
        }
        bounded(self.request_token(code), timeout, cancel).await
    }
}

/// `application/x-www-form-urlencoded` escaping of a basic auth component
fn escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
