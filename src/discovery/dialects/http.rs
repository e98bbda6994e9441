//! HTTP transport shared by both device dialects

use log::trace;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::config::{AdminCredential, ScannerConfig};
use crate::errors::{Result, ShellyError};

/// Raw answer to a mutating request
#[derive(Debug, Clone)]
pub struct ControlReply {
    pub status: u16,
    pub body: String,
}

impl ControlReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Body as JSON, when it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body for diagnostics, `None` when empty
    pub fn details(&self) -> Option<String> {
        if self.body.trim().is_empty() {
            None
        } else {
            Some(self.body.clone())
        }
    }
}

/// Thin wrapper around a reqwest client that knows device URLs and timeouts
#[derive(Debug, Clone)]
pub struct DeviceHttp {
    client: Client,
    device_port: u16,
    probe_timeout: Duration,
    control_timeout: Duration,
}

impl DeviceHttp {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        // Devices live on the LAN; never route probes through a system proxy
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ShellyError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            device_port: config.device_port,
            probe_timeout: config.probe_timeout(),
            control_timeout: config.control_timeout(),
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Absolute URL of `path` on the device at `ip`
    pub fn url(&self, ip: Ipv4Addr, path: &str) -> String {
        if self.device_port == 80 {
            format!("http://{}{}", ip, path)
        } else {
            format!("http://{}:{}{}", ip, self.device_port, path)
        }
    }

    /// Read-only discovery request
    pub fn probe_get(&self, ip: Ipv4Addr, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(ip, path))
            .timeout(self.probe_timeout)
    }

    /// Mutating GET request
    pub fn control_get(&self, ip: Ipv4Addr, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(ip, path))
            .timeout(self.control_timeout)
    }

    /// Mutating POST request
    pub fn control_post(&self, ip: Ipv4Addr, path: &str) -> RequestBuilder {
        self.client
            .post(self.url(ip, path))
            .timeout(self.control_timeout)
    }

    /// Send a request and decode a 200 JSON body
    ///
    /// 401 maps to `Unauthorized`, any other non-200 to `UnexpectedStatus`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        trace!("{} -> {}", response.url(), status);

        match status {
            200 => {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
            401 => Err(ShellyError::Unauthorized(response.url().to_string())),
            other => Err(ShellyError::UnexpectedStatus(other)),
        }
    }

    /// Send a mutating request and return whatever the device answered
    pub async fn send_control(&self, request: RequestBuilder) -> Result<ControlReply> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ControlReply { status, body })
    }
}

/// Attach HTTP Basic auth when a credential is present
pub fn with_basic_auth(
    request: RequestBuilder,
    credential: Option<&AdminCredential>,
) -> RequestBuilder {
    match credential {
        Some(credential) => request.basic_auth(credential.username(), Some(credential.password())),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_omits_default_port() {
        let http = DeviceHttp::new(&ScannerConfig::default()).unwrap();
        assert_eq!(
            http.url(Ipv4Addr::new(192, 168, 1, 9), "/shelly"),
            "http://192.168.1.9/shelly"
        );
    }

    #[test]
    fn test_url_with_custom_port() {
        let config = ScannerConfig {
            device_port: 8080,
            ..Default::default()
        };
        let http = DeviceHttp::new(&config).unwrap();
        assert_eq!(
            http.url(Ipv4Addr::new(10, 0, 0, 2), "/rpc/Shelly.GetDeviceInfo"),
            "http://10.0.0.2:8080/rpc/Shelly.GetDeviceInfo"
        );
    }

    #[test]
    fn test_control_reply_helpers() {
        let reply = ControlReply {
            status: 200,
            body: "{\"restart_required\":false}".to_string(),
        };
        assert!(reply.is_success());
        assert_eq!(reply.json().unwrap()["restart_required"], false);

        let empty = ControlReply {
            status: 500,
            body: "  ".to_string(),
        };
        assert!(!empty.is_success());
        assert!(empty.details().is_none());
        assert!(empty.json().is_none());
    }
}
