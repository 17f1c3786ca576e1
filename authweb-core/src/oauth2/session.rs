//! Token persistence in the per-user session

use std::collections::HashMap;

use chrono::{TimeDelta, Utc};
use oauth2::{AccessToken, RefreshToken};
use serde::{Deserialize, Serialize};

use super::TokenEntity;
use crate::{Error, Result};

pub const ACCESS_TOKEN_KEY: &str = "oauth2_access_token";
pub const EXPIRES_IN_KEY: &str = "oauth2_expires_in";
pub const REFRESH_TOKEN_KEY: &str = "oauth2_refresh_token";
pub const SCOPE_KEY: &str = "oauth2_scope";
pub const TOKEN_TYPE_KEY: &str = "oauth2_token_type";

const TOKEN_KEYS: [&str; 5] = [
    ACCESS_TOKEN_KEY,
    EXPIRES_IN_KEY,
    REFRESH_TOKEN_KEY,
    SCOPE_KEY,
    TOKEN_TYPE_KEY,
];

/// String-valued per-user session data.
///
/// Storage and transport of sessions belong to the HTTP layer; this type is
/// only the bag of values it carries between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    values: HashMap<String, String>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Flattens a [`TokenEntity`] into five session entries and back.
///
/// Expiry is never stored. It is recomputed from `oauth2_expires_in` on
/// every load, so the effective lifetime restarts each time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionTokenStore;

impl SessionTokenStore {
    pub fn persist(session: &mut Session, token: &TokenEntity) {
        session.insert(ACCESS_TOKEN_KEY, token.access_token.secret().as_str());
        session.insert(EXPIRES_IN_KEY, token.expires_in.to_string());
        session.insert(
            REFRESH_TOKEN_KEY,
            token
                .refresh_token
                .as_ref()
                .map(|t| t.secret().as_str())
                .unwrap_or_default(),
        );
        session.insert(SCOPE_KEY, token.scope.as_str());
        session.insert(TOKEN_TYPE_KEY, token.token_type.as_str());
    }

    /// # Errors
    /// [`Error::SessionMissing`] if any of the five entries is absent,
    /// [`Error::SessionMalformed`] if `oauth2_expires_in` is not an integer.
    pub fn load(session: &Session) -> Result<TokenEntity> {
        let access_token = required(session, ACCESS_TOKEN_KEY)?;
        let raw_expires_in = required(session, EXPIRES_IN_KEY)?;
        let refresh_token = required(session, REFRESH_TOKEN_KEY)?;
        let scope = required(session, SCOPE_KEY)?;
        let token_type = required(session, TOKEN_TYPE_KEY)?;

        let expires_in: i64 = raw_expires_in.parse().map_err(|e| Error::SessionMalformed {
            key: EXPIRES_IN_KEY,
            reason: format!("{raw_expires_in:?} is not an integer: {e}"),
        })?;

        let expiry = TimeDelta::try_seconds(expires_in)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| Error::SessionMalformed {
                key: EXPIRES_IN_KEY,
                reason: format!("{expires_in} is out of range"),
            })?;

        Ok(TokenEntity {
            access_token: AccessToken::new(access_token.to_string()),
            token_type: token_type.to_string(),
            expires_in,
            refresh_token: (!refresh_token.is_empty())
                .then(|| RefreshToken::new(refresh_token.to_string())),
            scope: scope.to_string(),
            expiry: Some(expiry),
        })
    }

    /// Drop every token entry, leaving the rest of the session untouched.
    pub fn clear(session: &mut Session) {
        for key in TOKEN_KEYS {
            session.remove(key);
        }
    }

    /// Whether the session holds an access token at all
    #[must_use]
    pub fn has_token(session: &Session) -> bool {
        session.get(ACCESS_TOKEN_KEY).is_some()
    }
}

fn required<'a>(session: &'a Session, key: &'static str) -> Result<&'a str> {
    session.get(key).ok_or(Error::SessionMissing(key))
}
