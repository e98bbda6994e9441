//! IPv4 subnet model and scan range resolution

use log::{debug, info, warn};
use std::fmt;
use std::net::{Ipv4Addr, UdpSocket};
use std::str::FromStr;

use crate::errors::{Result, ShellyError};

/// Prefix length assumed when the range is inferred from the local address
pub const DEFAULT_PREFIX_LEN: u8 = 24;

/// Destination used only to let the OS pick the outbound interface; nothing is sent
const ROUTING_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(10, 255, 255, 255), 1);

/// An IPv4 network with its prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetRange {
    network: Ipv4Addr,
    prefix_len: u8,
}

impl SubnetRange {
    /// Build a range containing `addr`; host bits are masked off
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(ShellyError::InvalidSubnet(format!(
                "prefix length {} > 32",
                prefix_len
            )));
        }
        let network = Ipv4Addr::from(u32::from(addr) & Self::mask(prefix_len));
        Ok(Self {
            network,
            prefix_len,
        })
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.network) | !Self::mask(self.prefix_len))
    }

    /// Number of usable host addresses: 2^(32 - prefix) - 2
    ///
    /// /31 and /32 networks have no room once network and broadcast are
    /// excluded, so they report zero.
    pub fn host_count(&self) -> u64 {
        (1u64 << (32 - u32::from(self.prefix_len))).saturating_sub(2)
    }

    /// Every usable host address in ascending order
    pub fn hosts(&self) -> impl Iterator<Item = Ipv4Addr> + Clone + use<> {
        let first = u64::from(u32::from(self.network)) + 1;
        let end = first + self.host_count();
        (first..end).map(|addr| Ipv4Addr::from(addr as u32))
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        u32::from(addr) & Self::mask(self.prefix_len) == u32::from(self.network)
    }
}

impl FromStr for SubnetRange {
    type Err = ShellyError;

    /// Accepts "a.b.c.d/len", "a.b.c.d/netmask", "a.b.c.d/hostmask" or a bare
    /// address (treated as /32)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, prefix),
            None => (s, "32"),
        };
        let addr: Ipv4Addr = addr
            .trim()
            .parse()
            .map_err(|e| ShellyError::InvalidSubnet(format!("{}: {}", s, e)))?;
        let prefix_len = parse_prefix(prefix.trim())
            .map_err(|e| ShellyError::InvalidSubnet(format!("{}: {}", s, e)))?;
        Self::new(addr, prefix_len)
    }
}

/// Prefix length from a decimal length or a dotted mask
///
/// Netmasks (`255.255.252.0`) win over hostmasks (`0.0.3.255`), so
/// `0.0.0.0` means /0 and `255.255.255.255` means /32.
fn parse_prefix(prefix: &str) -> std::result::Result<u8, String> {
    if let Ok(len) = prefix.parse::<u8>() {
        return Ok(len);
    }
    let mask = prefix
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| format!("invalid prefix length or mask '{}'", prefix))?;

    if mask.leading_ones() + mask.trailing_zeros() == 32 {
        return Ok(mask.leading_ones() as u8);
    }
    let netmask = !mask;
    if netmask.leading_ones() + netmask.trailing_zeros() == 32 {
        return Ok(netmask.leading_ones() as u8);
    }
    Err(format!("non-contiguous mask '{}'", prefix))
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Decides which network a scan covers
#[derive(Debug, Clone, Default)]
pub struct SubnetResolver {
    network_override: Option<String>,
}

impl SubnetResolver {
    pub fn new(network_override: Option<String>) -> Self {
        Self {
            network_override: network_override.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Resolve the scan range; never fails
    pub fn resolve(&self) -> SubnetRange {
        self.resolve_with(local_outbound_ipv4)
    }

    /// Resolve using a custom local address lookup
    pub fn resolve_with<F>(&self, local_addr: F) -> SubnetRange
    where
        F: FnOnce() -> Option<Ipv4Addr>,
    {
        if let Some(ref configured) = self.network_override {
            match configured.parse::<SubnetRange>() {
                Ok(range) => {
                    info!("Using configured network range: {}", range);
                    return range;
                }
                Err(e) => {
                    warn!(
                        "Invalid network range configured ({}): {}, falling back to auto-detection",
                        configured, e
                    );
                }
            }
        }

        let local_ip = local_addr().unwrap_or_else(|| {
            warn!("Could not determine local IPv4 address, using loopback");
            Ipv4Addr::LOCALHOST
        });
        debug!("Local IP detected: {}", local_ip);

        let range = match SubnetRange::new(local_ip, DEFAULT_PREFIX_LEN) {
            Ok(range) => range,
            Err(_) => SubnetRange {
                network: Ipv4Addr::new(127, 0, 0, 0),
                prefix_len: DEFAULT_PREFIX_LEN,
            },
        };
        info!("Scanning network range: {}", range);
        range
    }
}

/// Address the OS would use to reach an outside destination
///
/// Connecting a UDP socket only selects a route, so no packet leaves the host.
/// Falls back to the first non-loopback interface address.
pub fn local_outbound_ipv4() -> Option<Ipv4Addr> {
    let routed = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect(ROUTING_PROBE_ADDR)?;
            socket.local_addr()
        })
        .ok()
        .and_then(|addr| match addr.ip() {
            std::net::IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        });

    if routed.is_some() {
        return routed;
    }

    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .filter(|iface| !iface.is_loopback())
            .find_map(|iface| match iface.addr.ip() {
                std::net::IpAddr::V4(ip) => {
                    debug!("Using interface {} address {}", iface.name, ip);
                    Some(ip)
                }
                std::net::IpAddr::V6(_) => None,
            }),
        Err(e) => {
            warn!("Failed to get network interfaces: {}", e);
            None
        }
    }
}
