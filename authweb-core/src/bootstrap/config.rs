//! Configuration loading

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::Config;

/// Locations searched when no explicit path is given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config.yaml", "/config/config.yaml"];

/// Load and validate the configuration.
///
/// Config file search order:
/// 1. `explicit` (`--config` / `AUTHWEB_CONFIG_PATH`), which must exist
/// 2. ./config.yaml (current working directory)
/// 3. /config/config.yaml (container mount path)
/// 4. Environment variables only
///
/// Environment variables always overlay the file. Any validation problem is
/// fatal.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = match explicit {
        Some(path) if !Path::new(path).exists() => {
            bail!("Config file {path} does not exist");
        }
        Some(path) => Some(path.to_string()),
        None => find_config_file(&DEFAULT_CONFIG_PATHS),
    };

    // Logging is not up yet, so report straight to stderr
    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path).with_context(|| format!("Failed to load {path}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().context("Failed to load config from environment")?
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        bail!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        );
    }

    info!("Configuration loaded and validated successfully");
    Ok(config)
}

fn find_config_file(candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| (*p).to_string())
}
