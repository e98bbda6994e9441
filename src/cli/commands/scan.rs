//! Scan command implementation

use anyhow::Result;

use crate::config::ScannerConfig;
use crate::discovery::ShellyEngine;
use crate::models::DeviceRecord;

pub async fn execute_scan_command(config: ScannerConfig, json: bool) -> Result<()> {
    let engine = ShellyEngine::new(&config)?;
    let report = engine.scan_report().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.devices)?);
        return Ok(());
    }

    if report.devices.is_empty() {
        println!("📋 No Shelly devices found on {}", report.subnet);
    } else {
        println!("{}", format_table(&report.devices));
    }
    for (ip, reason) in &report.errored {
        println!("⚠️  {}: {}", ip, reason);
    }
    println!("📊 {}", report.summary());
    Ok(())
}

/// Fixed-width table, one device per line
pub(crate) fn format_table(devices: &[DeviceRecord]) -> String {
    let mut lines = vec![format!(
        "{:<15}  {:<4}  {:<14}  {:<12}  {:<5}  {}",
        "IP", "GEN", "TYPE", "MAC", "AUTH", "NAME"
    )];
    for device in devices {
        lines.push(format!(
            "{:<15}  {:<4}  {:<14}  {:<12}  {:<5}  {}",
            device.ip.to_string(),
            device.generation,
            device.model_or_type,
            device.mac_address,
            if device.auth_enabled { "on" } else { "off" },
            device.display_name
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Generation;
    use std::net::Ipv4Addr;

    #[test]
    fn test_table_has_header_and_rows() {
        let device = DeviceRecord {
            ip: Ipv4Addr::new(192, 168, 1, 20),
            model_or_type: "SHSW-1".to_string(),
            mac_address: "AABBCCDDEEFF".to_string(),
            auth_enabled: true,
            firmware_version: "1.14.0".to_string(),
            display_name: "Porch".to_string(),
            generation: Generation::Gen1,
        };
        let table = format_table(&[device]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("IP"));
        assert!(lines[1].starts_with("192.168.1.20"));
        assert!(lines[1].contains("Gen1"));
        assert!(lines[1].ends_with("Porch"));
    }
}
