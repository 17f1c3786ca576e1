//! Immutable provider configuration shared by every `OAuth2` component

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, Scope, TokenUrl};
use url::Url;

use super::providers::{resolve_endpoints, ProviderKind};
use crate::config::OAuth2Config;
use crate::{Error, Result};

/// Endpoint and credential bundle for the active identity provider.
///
/// Built once at startup from [`OAuth2Config`]; every URL is parsed here so
/// later operations never deal with malformed endpoints.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_url: RedirectUrl,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub profile_url: Url,
    pub tenant: Option<String>,
    /// Never empty
    pub scopes: Vec<Scope>,
}

impl ProviderConfig {
    /// # Errors
    /// Returns [`Error::Config`] on missing credentials, an empty scope list,
    /// or any endpoint that does not parse as an absolute URL.
    pub fn from_config(config: &OAuth2Config) -> Result<Self> {
        if config.client_id.trim().is_empty() {
            return Err(Error::Config("oauth2.client_id is required".to_string()));
        }
        if config.client_secret.is_empty() {
            return Err(Error::Config("oauth2.client_secret is required".to_string()));
        }
        let scopes: Vec<Scope> = config
            .scopes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Scope::new(s.to_string()))
            .collect();
        if scopes.is_empty() {
            return Err(Error::Config(
                "oauth2.scopes must contain at least one scope".to_string(),
            ));
        }

        let endpoints = resolve_endpoints(config)?;

        let redirect_url = RedirectUrl::new(config.redirect_url.clone()).map_err(|e| {
            Error::Config(format!(
                "Invalid oauth2.redirect_url {:?}: {e}",
                config.redirect_url
            ))
        })?;
        let auth_url = AuthUrl::new(endpoints.auth_url.clone()).map_err(|e| {
            Error::Config(format!("Invalid authorization endpoint {:?}: {e}", endpoints.auth_url))
        })?;
        let token_url = TokenUrl::new(endpoints.token_url.clone()).map_err(|e| {
            Error::Config(format!("Invalid token endpoint {:?}: {e}", endpoints.token_url))
        })?;
        let profile_url = Url::parse(&endpoints.profile_url).map_err(|e| {
            Error::Config(format!("Invalid profile endpoint {:?}: {e}", endpoints.profile_url))
        })?;

        Ok(Self {
            kind: config.provider,
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            redirect_url,
            auth_url,
            token_url,
            profile_url,
            tenant: config.tenant.clone(),
            scopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth2_config() -> OAuth2Config {
        OAuth2Config {
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            redirect_url: "http://localhost:8080/oauth2/callback".to_string(),
            ..OAuth2Config::default()
        }
    }

    #[test]
    fn test_from_config() {
        let provider = ProviderConfig::from_config(&oauth2_config()).unwrap();

        assert_eq!(provider.kind, ProviderKind::Google);
        assert_eq!(provider.client_id.as_str(), "client-1");
        assert_eq!(provider.client_secret.secret(), "s3cret");
        assert_eq!(provider.token_url.as_str(), "https://oauth2.googleapis.com/token");
        assert_eq!(provider.scopes.len(), 3);
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let provider = ProviderConfig::from_config(&oauth2_config()).unwrap();
        assert!(!format!("{provider:?}").contains("s3cret"));
    }

    #[test]
    fn test_rejects_blank_scopes() {
        let config = OAuth2Config {
            scopes: vec![" ".to_string()],
            ..oauth2_config()
        };
        assert!(matches!(
            ProviderConfig::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let config = OAuth2Config {
            auth_url: Some("not a url".to_string()),
            ..oauth2_config()
        };
        let err = ProviderConfig::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("authorization endpoint"));
    }

    #[test]
    fn test_rejects_missing_redirect() {
        let config = OAuth2Config {
            redirect_url: String::new(),
            ..oauth2_config()
        };
        assert!(ProviderConfig::from_config(&config).is_err());
    }
}
