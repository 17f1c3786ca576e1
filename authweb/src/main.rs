mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use authweb_core::{
    bootstrap::{init_services, load_config},
    logging,
};

use server::AuthWebServer;

/// Demo web front end with `OAuth2` sign-in
#[derive(Debug, Parser)]
#[command(name = "authweb", version, about)]
struct Cli {
    /// Path to a YAML config file (searched in ./config.yaml and
    /// /config/config.yaml when omitted)
    #[arg(short, long, env = "AUTHWEB_CONFIG_PATH")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load and validate configuration (fatal on any problem)
    let config = load_config(cli.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("AuthWeb server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Initialize services
    let services = init_services(&config)?;

    // 4. Serve until shutdown
    AuthWebServer::new(config, services).run().await
}
