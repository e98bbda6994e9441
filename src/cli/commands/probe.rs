//! Probe command implementation

use anyhow::Result;
use std::net::Ipv4Addr;

use crate::config::ScannerConfig;
use crate::discovery::ShellyEngine;
use crate::errors::ShellyError;
use crate::models::ProbeOutcome;

pub async fn execute_probe_command(config: ScannerConfig, ip: Ipv4Addr, json: bool) -> Result<()> {
    let engine = ShellyEngine::new(&config)?;

    match engine.probe(ip).await {
        ProbeOutcome::Found(device) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&device)?);
            } else {
                println!("{}", super::scan::format_table(std::slice::from_ref(&device)));
                println!("🔖 Firmware: {}", device.firmware_version);
            }
            Ok(())
        }
        ProbeOutcome::NotFound => Err(ShellyError::DeviceNotFound(ip).into()),
        ProbeOutcome::Errored(reason) => {
            Err(anyhow::anyhow!("{} answered but could not be read: {}", ip, reason))
        }
    }
}
