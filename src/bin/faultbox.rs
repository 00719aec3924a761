//! faultbox: fault-injection control plane
//!
//! Serves the scenario manager over HTTP so tests and operators can start,
//! stop and compose failure scenarios (CPU burn, memory growth, task leaks,
//! latency, health-check poisoning, disk pressure, crashes, dependency
//! failures) against this process.
//!
//! ## Configuration
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! log:
//!   mode: json
//! scenarios:
//!   tick_interval_ms: 1000
//!   scratch_dir: /tmp
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use faultbox::config::Config;
use faultbox::manager::ScenarioManager;
use faultbox::rest::{self, AppState};
use faultbox::utils::bootstrap::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "faultbox", version, about = "Fault-injection control plane")]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short = 'f', long = "config")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config.log);

    info!(
        name = %config.name,
        address = %config.server.bind_address(),
        tick_interval_ms = config.scenarios.tick_interval_ms,
        scratch_dir = %config.scenarios.scratch_dir.display(),
        "starting faultbox"
    );

    let manager = Arc::new(ScenarioManager::with_settings(config.scenarios.clone()));
    let state = AppState::new(Arc::clone(&manager), config.mock_service.clone());

    rest::serve(state, &config.server, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        info!("shutdown signal received");
    })
    .await?;

    manager.shutdown().await;
    info!("faultbox stopped");
    Ok(())
}
