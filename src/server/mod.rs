//! HTTP API server
//!
//! Thin warp layer over [`crate::discovery::ShellyEngine`]: route wiring,
//! JSON encoding and request logging.

pub mod app;
pub mod middleware;
pub mod routes;

pub use app::*;

use anyhow::Result;

use crate::config::ScannerConfig;

/// Start the scanner HTTP API and run until Ctrl+C
pub async fn start_server(config: ScannerConfig) -> Result<()> {
    let app = ServerApp::new(config)?;
    app.run().await
}
