//! Scan result models

use std::net::Ipv4Addr;

use super::device::DeviceRecord;
use crate::discovery::subnet::SubnetRange;

/// Full result of one subnet sweep, including per-host diagnostics
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub subnet: SubnetRange,
    pub hosts_probed: usize,
    /// Found devices, sorted by ascending address
    pub devices: Vec<DeviceRecord>,
    /// Hosts where no device of either generation answered
    pub not_found: usize,
    /// Hosts that answered with something undecodable
    pub errored: Vec<(Ipv4Addr, String)>,
}

impl ScanReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: probed {} hosts, found {} device(s), {} without a device, {} errored",
            self.subnet,
            self.hosts_probed,
            self.devices.len(),
            self.not_found,
            self.errored.len()
        )
    }
}
