//! Gen1 legacy REST dialect
//!
//! Authentication is HTTP Basic with the fixed username `admin`.

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::net::Ipv4Addr;

use super::DeviceDialect;
use super::http::{DeviceHttp, with_basic_auth};
use crate::config::{ADMIN_USERNAME, AdminCredential};
use crate::errors::{Result, ShellyError};
use crate::models::{DeviceRecord, Enrichment, Generation, PASSWORD_REQUIRED_NAME, UNKNOWN};

const SHELLY_PATH: &str = "/shelly";
const SETTINGS_PATH: &str = "/settings";
const LOGIN_PATH: &str = "/settings/login";
const OTA_PATH: &str = "/ota";

/// Payload of `GET /shelly`
#[derive(Debug, Deserialize)]
struct ShellyInfo {
    #[serde(rename = "type")]
    device_type: Option<String>,
    mac: Option<String>,
    auth: Option<bool>,
    fw: Option<String>,
}

/// Subset of `GET /settings`
#[derive(Debug, Deserialize)]
struct Settings {
    name: Option<String>,
    device: Option<SettingsDevice>,
}

#[derive(Debug, Deserialize)]
struct SettingsDevice {
    hostname: Option<String>,
}

pub struct Gen1Dialect {
    http: DeviceHttp,
    credential: Option<AdminCredential>,
}

impl Gen1Dialect {
    pub fn new(http: DeviceHttp, credential: Option<AdminCredential>) -> Self {
        Self { http, credential }
    }

    fn base_record(ip: Ipv4Addr, info: ShellyInfo) -> DeviceRecord {
        let device_type = non_empty(info.device_type).unwrap_or_else(|| UNKNOWN.to_string());

        DeviceRecord {
            ip,
            display_name: DeviceRecord::synthesized_name(&device_type),
            mac_address: non_empty(info.mac).unwrap_or_else(|| UNKNOWN.to_string()),
            auth_enabled: info.auth.unwrap_or(false),
            firmware_version: non_empty(info.fw).unwrap_or_else(|| UNKNOWN.to_string()),
            model_or_type: device_type,
            generation: Generation::Gen1,
        }
    }

    /// Device name from `/settings`
    ///
    /// 401 yields the password-required marker; any other failure yields
    /// `None` so the synthesized name stays.
    async fn enrich(&self, record: &DeviceRecord) -> Option<Enrichment> {
        let request = with_basic_auth(
            self.http.probe_get(record.ip, SETTINGS_PATH),
            self.credential.as_ref(),
        );

        match self.http.fetch_json::<Settings>(request).await {
            Ok(settings) => Some(Enrichment {
                display_name: Some(settings_name(settings, &record.mac_address, &record.model_or_type)),
            }),
            Err(ShellyError::Unauthorized(_)) => Some(Enrichment {
                display_name: Some(PASSWORD_REQUIRED_NAME.to_string()),
            }),
            Err(e) => {
                debug!("Gen1 settings lookup failed for {}: {}", record.ip, e);
                None
            }
        }
    }
}

/// Settings name, else hostname, else a MAC-derived label
fn settings_name(settings: Settings, mac_address: &str, device_type: &str) -> String {
    non_empty(settings.name)
        .or_else(|| non_empty(settings.device.and_then(|d| d.hostname)))
        .unwrap_or_else(|| {
            if mac_address == UNKNOWN {
                DeviceRecord::synthesized_name(device_type)
            } else {
                DeviceRecord::mac_suffix_name(mac_address)
            }
        })
}

/// Query parameters for `/settings/login`
pub fn login_params(enable: bool, credential: &AdminCredential) -> [(&'static str, String); 3] {
    [
        ("enabled", if enable { "1" } else { "0" }.to_string()),
        ("username", ADMIN_USERNAME.to_string()),
        (
            "password",
            if enable {
                credential.password().to_string()
            } else {
                String::new()
            },
        ),
    ]
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl DeviceDialect for Gen1Dialect {
    fn generation(&self) -> Generation {
        Generation::Gen1
    }

    async fn detect(&self, ip: Ipv4Addr) -> Result<DeviceRecord> {
        let info: ShellyInfo = self
            .http
            .fetch_json(self.http.probe_get(ip, SHELLY_PATH))
            .await?;
        let record = Self::base_record(ip, info);
        debug!("Found Gen1 Shelly device at {}: {}", ip, record.model_or_type);

        let enrichment = self.enrich(&record).await;
        Ok(record.merge(enrichment))
    }

    async fn trigger_update(
        &self,
        ip: Ipv4Addr,
        credential: Option<&AdminCredential>,
    ) -> Result<()> {
        let request = with_basic_auth(
            self.http
                .control_get(ip, OTA_PATH)
                .query(&[("update", "true")]),
            credential,
        );
        debug!("📤 GET {}?update=true", self.http.url(ip, OTA_PATH));

        let reply = self
            .http
            .send_control(request)
            .await
            .map_err(|e| ShellyError::UpdateFailed(e.to_string()))?;

        if reply.is_success() {
            info!("Gen1 update started on {}", ip);
            Ok(())
        } else {
            Err(ShellyError::UpdateFailed(format!(
                "Request failed with status {}",
                reply.status
            )))
        }
    }

    async fn set_auth(
        &self,
        device: &DeviceRecord,
        enable: bool,
        credential: &AdminCredential,
    ) -> Result<Option<Value>> {
        let params = login_params(enable, credential);
        debug!(
            "📤 GET {} enabled={}, username={}, password={}",
            self.http.url(device.ip, LOGIN_PATH),
            params[0].1,
            params[1].1,
            if params[2].1.is_empty() { "(empty)" } else { "***" }
        );

        let request = self.http.control_get(device.ip, LOGIN_PATH).query(&params);
        // A device that already has a login only accepts changes from that login
        let request = if device.auth_enabled {
            with_basic_auth(request, Some(credential))
        } else {
            request
        };

        let reply = self
            .http
            .send_control(request)
            .await
            .map_err(|e| ShellyError::AuthToggleFailed {
                reason: e.to_string(),
                details: None,
            })?;
        debug!("📥 {} {}", reply.status, reply.body);

        if reply.is_success() {
            Ok(reply.json())
        } else {
            Err(ShellyError::AuthToggleFailed {
                reason: format!("Request failed with status {}", reply.status),
                details: reply.details(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_record_defaults() {
        let info: ShellyInfo = serde_json::from_str("{}").unwrap();
        let record = Gen1Dialect::base_record(Ipv4Addr::new(192, 168, 0, 3), info);
        assert_eq!(record.model_or_type, UNKNOWN);
        assert_eq!(record.mac_address, UNKNOWN);
        assert_eq!(record.firmware_version, UNKNOWN);
        assert!(!record.auth_enabled);
        assert_eq!(record.display_name, "Shelly Device");
        assert_eq!(record.generation, Generation::Gen1);
    }

    #[test]
    fn test_settings_name_preference() {
        let settings: Settings = serde_json::from_str(
            r#"{"name": "Kitchen", "device": {"hostname": "shelly1-F45B21"}}"#,
        )
        .unwrap();
        assert_eq!(settings_name(settings, "A4CF12F45B21", "SHSW-1"), "Kitchen");

        let settings: Settings =
            serde_json::from_str(r#"{"name": null, "device": {"hostname": "shelly1-F45B21"}}"#)
                .unwrap();
        assert_eq!(
            settings_name(settings, "A4CF12F45B21", "SHSW-1"),
            "shelly1-F45B21"
        );

        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(
            settings_name(settings, "A4CF12F45B21", "SHSW-1"),
            "Shelly-F45B21"
        );

        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings_name(settings, UNKNOWN, "SHSW-1"), "Shelly SHSW-1");
    }

    #[test]
    fn test_login_params() {
        let credential = AdminCredential::new("pw").unwrap();
        let enable = login_params(true, &credential);
        assert_eq!(enable[0], ("enabled", "1".to_string()));
        assert_eq!(enable[1], ("username", "admin".to_string()));
        assert_eq!(enable[2], ("password", "pw".to_string()));

        let disable = login_params(false, &credential);
        assert_eq!(disable[0].1, "0");
        assert_eq!(disable[2].1, "");
    }
}
