use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::oauth2::{ProviderConfig, ProviderKind};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub oauth2: OAuth2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Session cookie settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Mark the cookie `Secure` (only sent over HTTPS)
    pub secure: bool,
    /// Sessions untouched for longer than this are dropped
    pub idle_timeout_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            secure: false,
            idle_timeout_seconds: 86400,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

/// `OAuth2` client configuration for the single active provider.
///
/// Endpoints default to the preset of `provider`; any of them can be
/// overridden individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    pub provider: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Directory tenant (`microsoft` only, defaults to `common`)
    pub tenant: Option<String>,
    /// Issuer base URL (`oidc` only)
    pub issuer: Option<String>,
    pub auth_url: Option<String>,
    pub token_url: Option<String>,
    pub profile_url: Option<String>,
    /// A list, or one space-separated string (as env vars provide it)
    #[serde(deserialize_with = "scope_list")]
    pub scopes: Vec<String>,
    pub exchange_timeout_seconds: u64,
    pub profile_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
            tenant: None,
            issuer: None,
            auth_url: None,
            token_url: None,
            profile_url: None,
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            exchange_timeout_seconds: 10,
            profile_timeout_seconds: 10,
        }
    }
}

impl OAuth2Config {
    #[must_use]
    pub const fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_seconds)
    }

    #[must_use]
    pub const fn profile_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_timeout_seconds)
    }
}

/// `AUTHWEB_OAUTH2__CLIENT_ID`, `AUTHWEB_SERVER__PORT`, ...
///
/// Values stay strings; numeric and boolean fields are converted on
/// deserialization, so credentials keep their exact text.
fn environment() -> Environment {
    Environment::with_prefix("AUTHWEB")
        .prefix_separator("_")
        .separator("__")
}

fn scope_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScopeList;

    impl<'de> Visitor<'de> for ScopeList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of scopes or a space-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut scopes = Vec::new();
            while let Some(scope) = seq.next_element::<String>()? {
                scopes.push(scope);
            }
            Ok(scopes)
        }
    }

    deserializer.deserialize_any(ScopeList)
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. `PORT` environment variable, then defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_default("server.port", port)?;
        }

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        builder = builder.add_source(environment());

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Check the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }
        if self.session.cookie_name.trim().is_empty() {
            errors.push("session.cookie_name must not be empty".to_string());
        }
        if self.session.idle_timeout_seconds == 0 {
            errors.push("session.idle_timeout_seconds must be > 0".to_string());
        }
        if self.oauth2.exchange_timeout_seconds == 0 {
            errors.push("oauth2.exchange_timeout_seconds must be > 0".to_string());
        }
        if self.oauth2.profile_timeout_seconds == 0 {
            errors.push("oauth2.profile_timeout_seconds must be > 0".to_string());
        }
        if let Err(e) = ProviderConfig::from_config(&self.oauth2) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
