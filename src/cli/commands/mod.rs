//! CLI command implementations

pub mod config;
pub mod control;
pub mod probe;
pub mod scan;
pub mod serve;

use anyhow::Result;

use crate::cli::args::Commands;
use crate::config::ScannerConfig;

/// Execute a CLI command against a resolved configuration
pub async fn execute_command(command: Commands, config: ScannerConfig) -> Result<()> {
    match command {
        Commands::Serve => serve::execute_serve_command(config).await,
        Commands::Scan { json } => scan::execute_scan_command(config, json).await,
        Commands::Probe { ip, json } => probe::execute_probe_command(config, ip, json).await,
        Commands::Update { ip } => control::execute_update_command(config, ip).await,
        Commands::Auth { ip, enable, .. } => {
            control::execute_auth_command(config, ip, enable).await
        }
        Commands::Config { output } => config::execute_config_command(output.as_deref()).await,
    }
}
