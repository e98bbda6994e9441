//! Shelly Scanner - discovery and control of Shelly devices
//!
//! Sweeps the local IPv4 subnet for Gen1 and Gen2 Shelly devices, normalizes
//! what they report, and triggers firmware updates or toggles their login,
//! either from the command line or through a small HTTP API.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod models;
pub mod server;
pub mod utils;

// Re-export commonly used types
pub use config::{AdminCredential, ScannerConfig};
pub use discovery::ShellyEngine;
pub use errors::*;
pub use models::*;

/// Shelly Scanner version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shelly Scanner application name
pub const APP_NAME: &str = "shelly-scanner";
