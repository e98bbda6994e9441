//! Single-host protocol detection

use log::{debug, trace};
use std::net::Ipv4Addr;

use super::dialects::{DeviceDialect, DeviceHttp, DialectRegistry};
use crate::config::ScannerConfig;
use crate::errors::Result;
use crate::models::{Generation, ProbeOutcome};

/// Identifies the device generation at one address and describes the device
pub struct DeviceProber {
    registry: DialectRegistry,
}

impl DeviceProber {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let http = DeviceHttp::new(config)?;
        Ok(Self {
            registry: DialectRegistry::new(http, config.credential()),
        })
    }

    /// Probe `ip`, trying each generation once, newest first
    ///
    /// Failure of a newer generation only means "not that generation". A
    /// failure of the last generation is `NotFound` when nothing answered and
    /// `Errored` when something answered with a body we could not use.
    pub async fn probe(&self, ip: Ipv4Addr) -> ProbeOutcome {
        let mut last_error = None;

        for dialect in self.registry.detection_order() {
            match dialect.detect(ip).await {
                Ok(device) => {
                    debug!(
                        "✅ {} {} at {}: {}",
                        device.generation, device.model_or_type, ip, device.display_name
                    );
                    return ProbeOutcome::Found(device);
                }
                Err(e) => {
                    trace!("{} not present at {}: {}", dialect.generation(), ip, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !e.is_absence() => {
                debug!("⚠️ {} answered but is not usable: {}", ip, e);
                ProbeOutcome::Errored(e.to_string())
            }
            _ => ProbeOutcome::NotFound,
        }
    }

    /// Dialect for a generation learned from an earlier probe
    pub fn dialect(&self, generation: Generation) -> Option<&dyn DeviceDialect> {
        self.registry.for_generation(generation)
    }
}
