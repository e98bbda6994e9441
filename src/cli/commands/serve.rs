//! Serve command implementation

use anyhow::Result;

use crate::config::ScannerConfig;
use crate::server::start_server;

pub async fn execute_serve_command(config: ScannerConfig) -> Result<()> {
    start_server(config).await
}
