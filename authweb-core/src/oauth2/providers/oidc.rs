//! Generic OIDC provider

use serde::{Deserialize, Serialize};

use super::Endpoints;

/// Endpoints derived from an issuer base URL
#[must_use]
pub fn endpoints(issuer: &str) -> Endpoints {
    let issuer = issuer.trim_end_matches('/');
    Endpoints {
        auth_url: format!("{issuer}/authorize"),
        token_url: format!("{issuer}/token"),
        profile_url: format!("{issuer}/userinfo"),
    }
}

/// Standard OIDC userinfo claims
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcProfile {
    pub sub: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub locale: Option<String>,
    pub picture: Option<String>,
}
