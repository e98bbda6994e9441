//! Device-related data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::config::AdminCredential;

/// Display name used when a Gen1 device refuses to reveal its settings
pub const PASSWORD_REQUIRED_NAME: &str = "🔒 Password Required";

/// Value reported for fields a device did not provide
pub const UNKNOWN: &str = "Unknown";

/// Device firmware protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Generation {
    /// Legacy REST API (`/shelly`, `/settings`), HTTP Basic auth
    Gen1,
    /// RPC API (`/rpc/...`), password embedded in the request
    Gen2,
}

impl From<Generation> for u8 {
    fn from(generation: Generation) -> Self {
        match generation {
            Generation::Gen1 => 1,
            Generation::Gen2 => 2,
        }
    }
}

impl TryFrom<u8> for Generation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Generation::Gen1),
            2 => Ok(Generation::Gen2),
            other => Err(format!("unknown device generation {}", other)),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Gen1 => write!(f, "Gen1"),
            Generation::Gen2 => write!(f, "Gen2"),
        }
    }
}

/// Normalized description of a detected device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device address
    pub ip: Ipv4Addr,
    /// Gen1 `type` or Gen2 `model`
    #[serde(rename = "type")]
    pub model_or_type: String,
    /// MAC address as reported by the device
    #[serde(rename = "mac")]
    pub mac_address: String,
    /// Whether the device currently requires a login
    #[serde(rename = "auth")]
    pub auth_enabled: bool,
    /// Firmware identifier
    #[serde(rename = "fw")]
    pub firmware_version: String,
    /// Best-effort human readable label, never empty
    #[serde(rename = "name")]
    pub display_name: String,
    pub generation: Generation,
}

impl DeviceRecord {
    /// Name used when nothing better is known: "Shelly <model>"
    pub fn synthesized_name(model_or_type: &str) -> String {
        if model_or_type.is_empty() || model_or_type == UNKNOWN {
            "Shelly Device".to_string()
        } else {
            format!("Shelly {}", model_or_type)
        }
    }

    /// Name derived from the last six characters of the MAC: "Shelly-A1B2C3"
    pub fn mac_suffix_name(mac_address: &str) -> String {
        let chars: Vec<char> = mac_address.chars().collect();
        let start = chars.len().saturating_sub(6);
        let suffix: String = chars[start..].iter().collect();
        format!("Shelly-{}", suffix)
    }

    pub fn auth_state(&self) -> AuthState {
        AuthState::from_enabled(self.auth_enabled)
    }
}

/// Best-effort details merged into a base record when available
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub display_name: Option<String>,
}

impl DeviceRecord {
    /// Merge optional enrichment; absent or blank fields leave the record unchanged
    pub fn merge(mut self, enrichment: Option<Enrichment>) -> Self {
        if let Some(name) = enrichment
            .and_then(|e| e.display_name)
            .filter(|n| !n.trim().is_empty())
        {
            self.display_name = name;
        }
        self
    }
}

/// Result of probing a single address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(DeviceRecord),
    NotFound,
    /// Something answered but could not be understood; kept for diagnostics
    Errored(String),
}

impl ProbeOutcome {
    pub fn into_device(self) -> Option<DeviceRecord> {
        match self {
            ProbeOutcome::Found(device) => Some(device),
            ProbeOutcome::NotFound | ProbeOutcome::Errored(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ProbeOutcome::Found(_))
    }
}

/// Authentication state of a device as seen by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Enabled,
    Disabled,
}

impl AuthState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            AuthState::Enabled
        } else {
            AuthState::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == AuthState::Enabled
    }
}

/// Mutating command sent to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOperation {
    UpdateFirmware,
    SetAuth { enabled: bool },
}

/// One control call: target, operation and the credential to use
#[derive(Debug, Clone)]
pub struct ControlRequest {
    pub target_ip: Ipv4Addr,
    pub operation: ControlOperation,
    pub credential: Option<AdminCredential>,
}

/// Device accepted the firmware update trigger
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStarted {
    pub ip: Ipv4Addr,
    pub generation: Generation,
}

/// Device accepted the authentication change
#[derive(Debug, Clone, PartialEq)]
pub struct AuthChanged {
    pub ip: Ipv4Addr,
    pub state: AuthState,
    /// JSON the device answered with, if it was JSON
    pub device_response: Option<serde_json::Value>,
}

/// Successful result of a control request
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutcome {
    UpdateStarted(UpdateStarted),
    AuthChanged(AuthChanged),
}
