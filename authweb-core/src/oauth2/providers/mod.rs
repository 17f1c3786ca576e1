//! `OAuth2` provider presets
//!
//! Each provider module contributes:
//! 1. Its default endpoints
//! 2. Its user profile schema
//!
//! The exchange mechanics are shared; a provider only differs in where it
//! lives and what its profile looks like.

pub mod google;
pub mod microsoft;
pub mod oidc;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::OAuth2Config;
use crate::{Error, Result};

pub use google::GoogleProfile;
pub use microsoft::MicrosoftProfile;
pub use oidc::OidcProfile;

/// Supported identity provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Generic `OAuth2` identity service
    #[default]
    Google,
    /// Tenant-scoped directory service
    Microsoft,
    /// OpenID Connect style userinfo service
    Oidc,
}

impl ProviderKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
            Self::Oidc => "oidc",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved endpoint set for a provider (before URL parsing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
}

/// Resolve the endpoints for the configured provider, applying overrides.
pub fn resolve_endpoints(config: &OAuth2Config) -> Result<Endpoints> {
    if config.tenant.is_some() && config.provider != ProviderKind::Microsoft {
        return Err(Error::Config(format!(
            "oauth2.tenant is only supported by the microsoft provider, not {}",
            config.provider
        )));
    }

    let preset = match config.provider {
        ProviderKind::Google => Some(google::endpoints()),
        ProviderKind::Microsoft => Some(microsoft::endpoints(
            config.tenant.as_deref().unwrap_or(microsoft::DEFAULT_TENANT),
        )?),
        ProviderKind::Oidc => config.issuer.as_deref().map(oidc::endpoints),
    };

    let pick = |custom: &Option<String>, preset: Option<&str>, name: &str| {
        custom
            .clone()
            .or_else(|| preset.map(str::to_string))
            .ok_or_else(|| {
                Error::Config(format!(
                    "oauth2.{name} is required when the {} provider has no issuer",
                    config.provider
                ))
            })
    };

    Ok(Endpoints {
        auth_url: pick(
            &config.auth_url,
            preset.as_ref().map(|e| e.auth_url.as_str()),
            "auth_url",
        )?,
        token_url: pick(
            &config.token_url,
            preset.as_ref().map(|e| e.token_url.as_str()),
            "token_url",
        )?,
        profile_url: pick(
            &config.profile_url,
            preset.as_ref().map(|e| e.profile_url.as_str()),
            "profile_url",
        )?,
    })
}
