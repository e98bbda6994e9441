//! Command line argument parsing

use clap::{Args, Parser, Subcommand};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::config::ConfigOverrides;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(name = "shelly-scanner")]
#[command(about = "🔌 Shelly device discovery and control for the local network")]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/shelly-scanner/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Emit server logs as JSON lines
    #[arg(long, global = true)]
    pub structured_logs: bool,

    /// Append server logs to this file instead of stdout
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<String>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Values that overlay the configuration file
#[derive(Args, Clone, Default)]
pub struct SettingsArgs {
    /// Admin password for devices with authentication enabled
    #[arg(long, global = true, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Network to scan, e.g. 192.168.1.0/24 (auto-detected when unset)
    #[arg(long, global = true, env = "NETWORK_RANGE")]
    pub network_range: Option<String>,

    /// HTTP API bind address
    #[arg(long = "bind", global = true)]
    pub bind_address: Option<String>,

    /// HTTP API port
    #[arg(long, global = true, env = "PORT")]
    pub port: Option<u16>,

    /// Port the devices serve HTTP on
    #[arg(long, global = true)]
    pub device_port: Option<u16>,

    /// Per-request discovery timeout in milliseconds
    #[arg(long, global = true)]
    pub probe_timeout_ms: Option<u64>,

    /// Per-request control timeout in milliseconds
    #[arg(long, global = true)]
    pub control_timeout_ms: Option<u64>,

    /// Maximum number of hosts probed at once
    #[arg(long = "concurrency", global = true)]
    pub max_concurrent_probes: Option<usize>,
}

impl SettingsArgs {
    /// Convert to config overrides; `ingress_port` wins over `--port`/`PORT`
    pub fn into_overrides(self, ingress_port: Option<u16>) -> ConfigOverrides {
        ConfigOverrides {
            admin_password: self.admin_password,
            network_range: self.network_range,
            bind_address: self.bind_address,
            port: ingress_port.or(self.port),
            device_port: self.device_port,
            probe_timeout_ms: self.probe_timeout_ms,
            control_timeout_ms: self.control_timeout_ms,
            max_concurrent_probes: self.max_concurrent_probes,
        }
    }
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Scan the subnet once and print the devices found
    Scan {
        /// Print the device list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Probe a single address
    Probe {
        ip: Ipv4Addr,
        /// Print the device as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a firmware update on a device
    Update { ip: Ipv4Addr },
    /// Enable or disable a device's login
    Auth {
        ip: Ipv4Addr,
        /// Turn authentication on
        #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
        enable: bool,
        /// Turn authentication off
        #[arg(long)]
        disable: bool,
    },
    /// Write a default configuration file
    Config {
        /// Destination (defaults to the standard config location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
