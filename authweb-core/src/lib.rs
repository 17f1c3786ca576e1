pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod oauth2;
pub mod service;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
