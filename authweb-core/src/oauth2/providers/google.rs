//! Google `OAuth2` provider

use serde::{Deserialize, Serialize};

use super::Endpoints;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[must_use]
pub fn endpoints() -> Endpoints {
    Endpoints {
        auth_url: AUTH_URL.to_string(),
        token_url: TOKEN_URL.to_string(),
        profile_url: USERINFO_URL.to_string(),
    }
}

/// Google userinfo (v2) response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleProfile {
    pub id: String,
    pub email: Option<String>,
    pub verified_email: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
}
