//! Subnet-wide scan with bounded parallelism

use log::{debug, info, warn};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::prober::DeviceProber;
use super::subnet::{SubnetRange, SubnetResolver};
use crate::config::ScannerConfig;
use crate::models::{DeviceRecord, ProbeOutcome, ScanReport};

/// Sweeps a subnet, probing every host address concurrently
#[derive(Clone)]
pub struct ScanCoordinator {
    resolver: SubnetResolver,
    prober: Arc<DeviceProber>,
    max_concurrent_probes: usize,
}

impl ScanCoordinator {
    pub fn new(config: &ScannerConfig, prober: Arc<DeviceProber>) -> Self {
        Self {
            resolver: SubnetResolver::new(config.network_override().map(str::to_string)),
            prober,
            max_concurrent_probes: config.max_concurrent_probes.max(1),
        }
    }

    /// Found devices on the resolved subnet, sorted by address
    pub async fn scan(&self) -> Vec<DeviceRecord> {
        self.scan_report().await.devices
    }

    /// Scan the resolved subnet and keep per-host diagnostics
    pub async fn scan_report(&self) -> ScanReport {
        let subnet = self.resolver.resolve();
        self.scan_subnet(subnet).await
    }

    /// Scan an explicit subnet
    pub async fn scan_subnet(&self, subnet: SubnetRange) -> ScanReport {
        let started = Instant::now();
        info!(
            "🔍 Starting scan of {} ({} host addresses)...",
            subnet,
            subnet.host_count()
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_probes));
        let mut probes: JoinSet<(Ipv4Addr, ProbeOutcome)> = JoinSet::new();

        for ip in subnet.hosts() {
            // Wait for a free slot before spawning so large ranges never
            // hold more than the cap worth of tasks
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let prober = Arc::clone(&self.prober);
            probes.spawn(async move {
                let outcome = prober.probe(ip).await;
                drop(permit);
                (ip, outcome)
            });
        }

        let mut report = ScanReport {
            subnet,
            hosts_probed: 0,
            devices: Vec::new(),
            not_found: 0,
            errored: Vec::new(),
        };

        while let Some(joined) = probes.join_next().await {
            report.hosts_probed += 1;
            match joined {
                Ok((_, ProbeOutcome::Found(device))) => report.devices.push(device),
                Ok((_, ProbeOutcome::NotFound)) => report.not_found += 1,
                Ok((ip, ProbeOutcome::Errored(reason))) => report.errored.push((ip, reason)),
                Err(e) => {
                    warn!("Probe task failed: {}", e);
                    report.not_found += 1;
                }
            }
        }

        // Completion order is arbitrary; the address order is the contract
        report.devices.sort_by_key(|device| device.ip);
        report.errored.sort_by_key(|(ip, _)| *ip);

        for (ip, reason) in &report.errored {
            debug!("  ⚠️ {}: {}", ip, reason);
        }
        info!(
            "✅ Scan complete in {:.1}s. {}",
            started.elapsed().as_secs_f64(),
            report.summary()
        );
        report
    }
}
