//! Mutating device operations
//!
//! Every operation re-probes the device first: the dispatcher keeps no device
//! state, so the generation and current auth flag always come fresh from the
//! device. That costs one extra round of discovery requests per call.

use log::{info, warn};
use std::net::Ipv4Addr;
use std::sync::Arc;

use super::prober::DeviceProber;
use crate::config::{AdminCredential, ScannerConfig};
use crate::errors::{Result, ShellyError};
use crate::models::{
    AuthChanged, AuthState, ControlOperation, ControlOutcome, ControlRequest, DeviceRecord,
    ProbeOutcome, UpdateStarted,
};

/// Issues generation-specific control requests
#[derive(Clone)]
pub struct ControlDispatcher {
    prober: Arc<DeviceProber>,
    credential: Option<AdminCredential>,
}

impl ControlDispatcher {
    pub fn new(config: &ScannerConfig, prober: Arc<DeviceProber>) -> Self {
        Self {
            prober,
            credential: config.credential(),
        }
    }

    /// Request carrying the configured credential
    pub fn request(&self, target_ip: Ipv4Addr, operation: ControlOperation) -> ControlRequest {
        ControlRequest {
            target_ip,
            operation,
            credential: self.credential.clone(),
        }
    }

    /// Trigger a firmware update on the device at `ip`
    pub async fn update(&self, ip: Ipv4Addr) -> Result<UpdateStarted> {
        match self
            .execute(self.request(ip, ControlOperation::UpdateFirmware))
            .await?
        {
            ControlOutcome::UpdateStarted(started) => Ok(started),
            ControlOutcome::AuthChanged(_) => Err(ShellyError::UpdateFailed(
                "unexpected control outcome".to_string(),
            )),
        }
    }

    /// Enable or disable the login on the device at `ip`
    pub async fn set_auth(&self, ip: Ipv4Addr, enable: bool) -> Result<AuthChanged> {
        match self
            .execute(self.request(ip, ControlOperation::SetAuth { enabled: enable }))
            .await?
        {
            ControlOutcome::AuthChanged(changed) => Ok(changed),
            ControlOutcome::UpdateStarted(_) => Err(ShellyError::AuthToggleFailed {
                reason: "unexpected control outcome".to_string(),
                details: None,
            }),
        }
    }

    /// Run one control request
    pub async fn execute(&self, request: ControlRequest) -> Result<ControlOutcome> {
        match request.operation {
            ControlOperation::UpdateFirmware => {
                let device = self.locate(request.target_ip).await?;
                let dialect = self.prober.dialect(device.generation).ok_or_else(|| {
                    ShellyError::UpdateFailed(format!("no dialect for {}", device.generation))
                })?;

                dialect
                    .trigger_update(device.ip, request.credential.as_ref())
                    .await?;
                info!("🔄 Update started on {} ({})", device.ip, device.generation);

                Ok(ControlOutcome::UpdateStarted(UpdateStarted {
                    ip: device.ip,
                    generation: device.generation,
                }))
            }
            ControlOperation::SetAuth { enabled } => {
                // No password means nothing to provision; fail before touching the network
                let credential = request
                    .credential
                    .as_ref()
                    .ok_or(ShellyError::CredentialsNotConfigured)?;

                let device = self.locate(request.target_ip).await?;
                info!(
                    "🔐 {} authentication on {} ({}), currently {}",
                    if enabled { "Enabling" } else { "Disabling" },
                    device.ip,
                    device.generation,
                    if device.auth_enabled { "enabled" } else { "disabled" }
                );

                let dialect = self.prober.dialect(device.generation).ok_or_else(|| {
                    ShellyError::AuthToggleFailed {
                        reason: format!("no dialect for {}", device.generation),
                        details: None,
                    }
                })?;

                let device_response = dialect.set_auth(&device, enabled, credential).await?;
                info!(
                    "✅ Auth {} on {}",
                    if enabled { "enabled" } else { "disabled" },
                    device.ip
                );

                Ok(ControlOutcome::AuthChanged(AuthChanged {
                    ip: device.ip,
                    state: AuthState::from_enabled(enabled),
                    device_response,
                }))
            }
        }
    }

    async fn locate(&self, ip: Ipv4Addr) -> Result<DeviceRecord> {
        match self.prober.probe(ip).await {
            ProbeOutcome::Found(device) => Ok(device),
            ProbeOutcome::NotFound => {
                warn!("❌ Device not found at {}", ip);
                Err(ShellyError::DeviceNotFound(ip))
            }
            ProbeOutcome::Errored(reason) => {
                warn!("❌ Device at {} could not be identified: {}", ip, reason);
                Err(ShellyError::DeviceNotFound(ip))
            }
        }
    }
}
