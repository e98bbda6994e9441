//! Command Line Interface module
//!
//! Argument parsing and one handler per subcommand.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;

use crate::config::ScannerConfig;
use crate::utils::logging::{init_cli_logging, init_server_logging, level_from_flags};

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let command = cli.command.clone().unwrap_or(Commands::Serve);

    match &command {
        Commands::Serve => init_server_logging(
            cli.structured_logs,
            cli.log_file.as_deref(),
            Some(level_from_flags(cli.verbose, cli.quiet)),
        )?,
        _ => init_cli_logging(cli.verbose, cli.quiet)?,
    }

    if let Commands::Config { output } = &command {
        return commands::config::execute_config_command(output.as_deref()).await;
    }

    let config = resolve_config(&cli)?;
    log::debug!("Effective configuration: {:?}", config);
    commands::execute_command(command, config).await
}

/// File (or defaults) overlaid with CLI/environment values
pub fn resolve_config(cli: &Cli) -> Result<ScannerConfig> {
    let ingress_port = std::env::var("INGRESS_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok());

    let config = ScannerConfig::load_or_default(cli.config.as_deref())?
        .apply_overrides(cli.settings.clone().into_overrides(ingress_port))?;
    Ok(config)
}
