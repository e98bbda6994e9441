//! Update and auth command implementations

use anyhow::Result;
use std::net::Ipv4Addr;

use crate::config::ScannerConfig;
use crate::discovery::ShellyEngine;

pub async fn execute_update_command(config: ScannerConfig, ip: Ipv4Addr) -> Result<()> {
    let engine = ShellyEngine::new(&config)?;
    let started = engine.update(ip).await?;
    println!(
        "✅ Update started on {} ({})",
        started.ip, started.generation
    );
    Ok(())
}

pub async fn execute_auth_command(config: ScannerConfig, ip: Ipv4Addr, enable: bool) -> Result<()> {
    let engine = ShellyEngine::new(&config)?;
    let changed = engine.set_auth(ip, enable).await?;
    println!(
        "✅ Authentication {} on {}",
        if changed.state.is_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        changed.ip
    );
    if let Some(response) = changed.device_response {
        log::debug!("Device replied: {}", response);
    }
    Ok(())
}
