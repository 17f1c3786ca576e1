//! Startup wiring for the `authweb` server
//!
//! - Configuration loading and validation
//! - Service construction

pub mod config;
pub mod services;

pub use config::load_config;
pub use services::{init_services, Services};
