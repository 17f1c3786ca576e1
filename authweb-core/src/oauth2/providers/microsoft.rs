//! Microsoft identity platform (tenant-scoped directory) provider
//!
//! Authorization and token endpoints are templated on the directory tenant;
//! the profile comes from Microsoft Graph `/me`.

use serde::{Deserialize, Serialize};

use super::Endpoints;
use crate::{Error, Result};

pub const DEFAULT_TENANT: &str = "common";

const LOGIN_BASE: &str = "https://login.microsoftonline.com";
const GRAPH_ME_URL: &str = "https://graph.microsoft.com/v1.0/me";

/// Endpoints for `tenant` (a tenant id, a verified domain, or
/// `common` / `organizations` / `consumers`).
pub fn endpoints(tenant: &str) -> Result<Endpoints> {
    let tenant = tenant.trim();
    if tenant.is_empty() || tenant.contains(['/', '?', '#']) {
        return Err(Error::Config(format!("invalid oauth2.tenant: {tenant:?}")));
    }

    Ok(Endpoints {
        auth_url: format!("{LOGIN_BASE}/{tenant}/oauth2/v2.0/authorize"),
        token_url: format!("{LOGIN_BASE}/{tenant}/oauth2/v2.0/token"),
        profile_url: GRAPH_ME_URL.to_string(),
    })
}

/// Microsoft Graph user resource (subset)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MicrosoftProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub job_title: Option<String>,
    pub mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub office_location: Option<String>,
    pub preferred_language: Option<String>,
    pub surname: Option<String>,
    pub user_principal_name: Option<String>,
}
