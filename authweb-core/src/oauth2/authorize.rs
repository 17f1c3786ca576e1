//! Authorization redirect construction

use oauth2::Scope;
use url::Url;

use super::ProviderConfig;
use crate::{Error, Result};

impl ProviderConfig {
    /// Build the authorization endpoint URL the user agent is redirected to.
    ///
    /// Appends `client_id`, `redirect_uri`, `response_type=code` and the
    /// space-joined `scope` to whatever query the endpoint already carries.
    pub fn build_authorization_url(&self, scopes: &[Scope]) -> Result<Url> {
        if scopes.is_empty() {
            return Err(Error::Config(
                "at least one scope is required to build an authorization URL".to_string(),
            ));
        }

        let scope = scopes
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let mut url = self.auth_url.url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.client_id.as_str())
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &scope);

        Ok(url)
    }

    /// Authorization URL for the configured scopes
    pub fn authorization_url(&self) -> Result<Url> {
        self.build_authorization_url(&self.scopes)
    }
}
