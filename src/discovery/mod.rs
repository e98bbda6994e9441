//! Device discovery and control engine
//!
//! Resolves the subnet, probes every host for a Gen1 or Gen2 Shelly device
//! and issues generation-specific control requests.

pub mod control;
pub mod coordinator;
pub mod dialects;
pub mod prober;
pub mod subnet;

pub use control::ControlDispatcher;
pub use coordinator::ScanCoordinator;
pub use prober::DeviceProber;
pub use subnet::{SubnetRange, SubnetResolver};

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::config::ScannerConfig;
use crate::errors::Result;
use crate::models::{AuthChanged, DeviceRecord, ProbeOutcome, ScanReport, UpdateStarted};

/// The engine's entry points, wired from one immutable configuration
#[derive(Clone)]
pub struct ShellyEngine {
    prober: Arc<DeviceProber>,
    coordinator: ScanCoordinator,
    dispatcher: ControlDispatcher,
}

impl ShellyEngine {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let prober = Arc::new(DeviceProber::new(config)?);
        Ok(Self {
            coordinator: ScanCoordinator::new(config, Arc::clone(&prober)),
            dispatcher: ControlDispatcher::new(config, Arc::clone(&prober)),
            prober,
        })
    }

    /// All devices on the subnet, sorted by address
    pub async fn scan(&self) -> Vec<DeviceRecord> {
        self.coordinator.scan().await
    }

    /// Scan with per-host diagnostics
    pub async fn scan_report(&self) -> ScanReport {
        self.coordinator.scan_report().await
    }

    /// Probe a single address
    pub async fn probe(&self, ip: Ipv4Addr) -> ProbeOutcome {
        self.prober.probe(ip).await
    }

    pub async fn update(&self, ip: Ipv4Addr) -> Result<UpdateStarted> {
        self.dispatcher.update(ip).await
    }

    pub async fn set_auth(&self, ip: Ipv4Addr, enable: bool) -> Result<AuthChanged> {
        self.dispatcher.set_auth(ip, enable).await
    }

    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> &ControlDispatcher {
        &self.dispatcher
    }
}
