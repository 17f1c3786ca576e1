//! `OAuth2` authorization code grant client
//!
//! The flow is split across small pieces sharing one [`ProviderConfig`]:
//! - [`ProviderConfig::authorization_url`] builds the front-channel redirect
//! - [`TokenExchanger`] trades the returned code for a [`TokenEntity`]
//! - [`SessionTokenStore`] flattens the token into the user's [`Session`]
//! - [`UserProfileFetcher`] reads the user's profile with the stored token

mod authorize;
mod profile;
mod provider;
pub mod providers;
pub mod session;
mod token;
mod transport;

pub use profile::{UserProfile, UserProfileFetcher};
pub use provider::ProviderConfig;
pub use providers::ProviderKind;
pub use session::{Session, SessionTokenStore};
pub use token::{TokenEntity, TokenExchange, TokenExchanger};

#[cfg(test)]
pub use token::MockTokenExchange;
