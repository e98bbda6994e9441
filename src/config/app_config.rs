//! Scanner configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, ShellyError};

/// Fixed login name used by both device generations
pub const ADMIN_USERNAME: &str = "admin";

/// Main scanner configuration, read once at startup and never mutated
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Admin password used for authenticated requests (empty = unset)
    pub admin_password: String,
    /// Explicit network to scan, e.g. "192.168.1.0/24"
    pub network_range: Option<String>,
    /// HTTP API listening address
    pub bind_address: String,
    /// HTTP API listening port
    pub port: u16,
    /// Port the devices serve their HTTP API on
    pub device_port: u16,
    /// Timeout for each discovery request in milliseconds
    pub probe_timeout_ms: u64,
    /// Timeout for each mutating request in milliseconds
    pub control_timeout_ms: u64,
    /// Upper bound on in-flight probes during a scan
    pub max_concurrent_probes: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            admin_password: String::new(),
            network_range: None,
            bind_address: "0.0.0.0".to_string(),
            port: 8099,
            device_port: 80,
            probe_timeout_ms: 2000,
            control_timeout_ms: 5000,
            max_concurrent_probes: 50,
        }
    }
}

impl fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("admin_password", &self.credential())
            .field("network_range", &self.network_range)
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("device_port", &self.device_port)
            .field("probe_timeout_ms", &self.probe_timeout_ms)
            .field("control_timeout_ms", &self.control_timeout_ms)
            .field("max_concurrent_probes", &self.max_concurrent_probes)
            .finish()
    }
}

/// Values taken from the command line or environment that win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub admin_password: Option<String>,
    pub network_range: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub device_port: Option<u16>,
    pub probe_timeout_ms: Option<u64>,
    pub control_timeout_ms: Option<u64>,
    pub max_concurrent_probes: Option<usize>,
}

impl ScannerConfig {
    /// Default configuration file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shelly-scanner")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShellyError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ScannerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit file, or the default file if it exists, or defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    log::debug!("Loading configuration from {}", default_path.display());
                    Self::load(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Write configuration as pretty TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply command line / environment overrides; blank strings count as unset
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(password) = overrides.admin_password.filter(|p| !p.trim().is_empty()) {
            self.admin_password = password;
        }
        if let Some(range) = overrides.network_range.filter(|r| !r.trim().is_empty()) {
            self.network_range = Some(range);
        }
        if let Some(bind) = overrides.bind_address.filter(|b| !b.trim().is_empty()) {
            self.bind_address = bind;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(port) = overrides.device_port {
            self.device_port = port;
        }
        if let Some(timeout) = overrides.probe_timeout_ms {
            self.probe_timeout_ms = timeout;
        }
        if let Some(timeout) = overrides.control_timeout_ms {
            self.control_timeout_ms = timeout;
        }
        if let Some(limit) = overrides.max_concurrent_probes {
            self.max_concurrent_probes = limit;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_probes == 0 {
            return Err(ShellyError::Config(
                "max_concurrent_probes must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout_ms == 0 || self.control_timeout_ms == 0 {
            return Err(ShellyError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Admin credential, if a non-empty password is configured
    pub fn credential(&self) -> Option<AdminCredential> {
        AdminCredential::new(&self.admin_password)
    }

    /// Trimmed subnet override, if any
    pub fn network_override(&self) -> Option<&str> {
        self.network_range
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }
}

/// Admin password that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential(String);

impl AdminCredential {
    /// Wrap a password; empty passwords mean "no credential"
    pub fn new(password: &str) -> Option<Self> {
        if password.is_empty() {
            None
        } else {
            Some(Self(password.to_string()))
        }
    }

    pub fn username(&self) -> &'static str {
        ADMIN_USERNAME
    }

    pub fn password(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminCredential(***)")
    }
}

impl fmt::Display for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}
