//! Service initialization

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::oauth2::ProviderConfig;
use crate::service::OAuth2Service;
use crate::Config;

/// Container for the initialized services
#[derive(Debug, Clone)]
pub struct Services {
    pub provider: Arc<ProviderConfig>,
    pub oauth2_service: Arc<OAuth2Service>,
}

/// Build the provider configuration and the services that share it.
pub fn init_services(config: &Config) -> anyhow::Result<Services> {
    let provider = Arc::new(
        ProviderConfig::from_config(&config.oauth2).context("Invalid OAuth2 configuration")?,
    );

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("authweb/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let oauth2_service = Arc::new(OAuth2Service::from_config(
        Arc::clone(&provider),
        &config.oauth2,
        http_client,
    ));

    info!(
        provider = %provider.kind,
        auth_url = %provider.auth_url.as_str(),
        "OAuth2 service initialized"
    );

    Ok(Services {
        provider,
        oauth2_service,
    })
}
