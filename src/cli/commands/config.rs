//! Config command implementation

use anyhow::Result;
use std::path::Path;

use crate::config::ScannerConfig;

/// Write a default configuration file
pub async fn execute_config_command(output: Option<&Path>) -> Result<()> {
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(ScannerConfig::default_path);

    ScannerConfig::default().save(&path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to write config file '{}': {}",
            path.display(),
            e
        )
    })?;

    println!(
        "✅ Generated default configuration file: {}",
        path.display()
    );
    println!("ℹ️  Use --config {} to load this configuration.", path.display());
    Ok(())
}
