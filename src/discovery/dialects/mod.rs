//! Generation-specific device protocols
//!
//! Gen1 and Gen2 devices expose incompatible endpoints and authentication
//! schemes. Each generation is one [`DeviceDialect`]; the [`DialectRegistry`]
//! holds them in detection order and hands out the right one for a
//! previously detected generation.

pub mod gen1;
pub mod gen2;
pub mod http;

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::config::AdminCredential;
use crate::errors::Result;
use crate::models::{DeviceRecord, Generation};

pub use http::DeviceHttp;

/// Operations every device generation must support
#[async_trait]
pub trait DeviceDialect: Send + Sync {
    /// Generation spoken by this dialect
    fn generation(&self) -> Generation;

    /// Identify a device of this generation at `ip` and describe it
    ///
    /// Fails when the generation's discovery endpoint does not answer with a
    /// usable payload. Optional enrichment never makes this fail.
    async fn detect(&self, ip: Ipv4Addr) -> Result<DeviceRecord>;

    /// Ask the device to start a firmware update from the stable channel
    async fn trigger_update(&self, ip: Ipv4Addr, credential: Option<&AdminCredential>)
    -> Result<()>;

    /// Enable or disable the device login
    ///
    /// `device` is the freshly probed record; its auth flag decides how the
    /// request itself is authorized. Returns the device's JSON reply if any.
    async fn set_auth(
        &self,
        device: &DeviceRecord,
        enable: bool,
        credential: &AdminCredential,
    ) -> Result<Option<serde_json::Value>>;
}

/// Registry of supported device dialects
pub struct DialectRegistry {
    dialects: Vec<Box<dyn DeviceDialect>>,
}

impl DialectRegistry {
    /// Create a registry with every supported generation, newest first
    pub fn new(http: DeviceHttp, credential: Option<AdminCredential>) -> Self {
        let dialects: Vec<Box<dyn DeviceDialect>> = vec![
            Box::new(gen2::Gen2Dialect::new(http.clone(), credential.clone())),
            Box::new(gen1::Gen1Dialect::new(http, credential)),
        ];

        Self { dialects }
    }

    /// Dialects in the order a probe must try them
    pub fn detection_order(&self) -> impl Iterator<Item = &dyn DeviceDialect> {
        self.dialects.iter().map(|dialect| dialect.as_ref())
    }

    /// Dialect for an already known generation
    pub fn for_generation(&self, generation: Generation) -> Option<&dyn DeviceDialect> {
        self.dialects
            .iter()
            .find(|dialect| dialect.generation() == generation)
            .map(|dialect| dialect.as_ref())
    }
}
