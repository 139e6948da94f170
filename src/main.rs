//! OpenClaw Monitor Gateway binary.
//!
//! Serves every domain with its stand-in sub-router; host applications embed
//! the library and mount real ones through [`RouteTable`].

use openclaw_monitor_gateway::{logging, startup, Config, RouteTable};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting OpenClaw Monitor Gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        home = %config.home_path.display(),
        auth_enabled = config.shared_secret().is_some(),
        "Configuration loaded"
    );

    let table = RouteTable::with_unmounted_domains()?;

    let gateway = startup::start(&config, table).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        anyhow::anyhow!(e)
    })?;

    gateway.serve().await?;

    Ok(())
}
