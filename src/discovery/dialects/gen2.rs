//! Gen2+ RPC dialect
//!
//! Password-only authentication: the admin password travels inside the
//! request (query string or JSON body), there is no username.

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::Ipv4Addr;

use super::DeviceDialect;
use super::http::DeviceHttp;
use crate::config::{ADMIN_USERNAME, AdminCredential};
use crate::errors::{Result, ShellyError};
use crate::models::{DeviceRecord, Enrichment, Generation, UNKNOWN};

const DEVICE_INFO_PATH: &str = "/rpc/Shelly.GetDeviceInfo";
const GET_CONFIG_PATH: &str = "/rpc/Shelly.GetConfig";
const SET_CONFIG_PATH: &str = "/rpc/Sys.SetConfig";
const UPDATE_PATH: &str = "/rpc/Shelly.Update";

/// Subset of `Shelly.GetDeviceInfo` we care about
#[derive(Debug, Deserialize)]
struct DeviceInfo {
    model: Option<String>,
    mac: Option<String>,
    auth_en: Option<bool>,
    fw_id: Option<String>,
    ver: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceConfig {
    sys: Option<SysConfig>,
}

#[derive(Debug, Deserialize)]
struct SysConfig {
    device: Option<SysDevice>,
}

#[derive(Debug, Deserialize)]
struct SysDevice {
    name: Option<String>,
}

pub struct Gen2Dialect {
    http: DeviceHttp,
    credential: Option<AdminCredential>,
}

impl Gen2Dialect {
    pub fn new(http: DeviceHttp, credential: Option<AdminCredential>) -> Self {
        Self { http, credential }
    }

    fn base_record(ip: Ipv4Addr, info: DeviceInfo) -> DeviceRecord {
        let model = non_empty(info.model).unwrap_or_else(|| UNKNOWN.to_string());
        let display_name =
            non_empty(info.name).unwrap_or_else(|| DeviceRecord::synthesized_name(&model));

        DeviceRecord {
            ip,
            mac_address: non_empty(info.mac).unwrap_or_else(|| UNKNOWN.to_string()),
            auth_enabled: info.auth_en.unwrap_or(false),
            firmware_version: non_empty(info.fw_id)
                .or_else(|| non_empty(info.ver))
                .unwrap_or_else(|| UNKNOWN.to_string()),
            display_name,
            model_or_type: model,
            generation: Generation::Gen2,
        }
    }

    /// Friendly name from the device config; any failure yields `None`
    async fn enrich(&self, ip: Ipv4Addr, credential: &AdminCredential) -> Option<Enrichment> {
        let request = self
            .http
            .probe_get(ip, GET_CONFIG_PATH)
            .query(&[("password", credential.password())]);

        match self.http.fetch_json::<DeviceConfig>(request).await {
            Ok(config) => Some(Enrichment {
                display_name: config.sys.and_then(|s| s.device).and_then(|d| d.name),
            }),
            Err(e) => {
                debug!("Gen2 config enrichment failed for {}: {}", ip, e);
                None
            }
        }
    }
}

/// `Sys.SetConfig` payload toggling the device login
///
/// When auth is currently enabled the existing password must also be sent at
/// the top level, otherwise the device rejects any config change.
pub fn set_auth_payload(enable: bool, credential: &AdminCredential, currently_enabled: bool) -> Value {
    let pass = if enable { credential.password() } else { "" };
    let mut payload = json!({
        "config": {
            "auth": {
                "enable": enable,
                "user": ADMIN_USERNAME,
                "pass": pass,
            }
        }
    });
    if currently_enabled {
        payload["password"] = Value::String(credential.password().to_string());
    }
    payload
}

/// `Shelly.Update` payload requesting the stable channel
pub fn update_payload(credential: Option<&AdminCredential>) -> Value {
    let mut payload = json!({ "stage": "stable" });
    if let Some(credential) = credential {
        payload["password"] = Value::String(credential.password().to_string());
    }
    payload
}

/// Copy of a payload with every password replaced by "***", for logging
pub fn masked(payload: &Value) -> Value {
    let mut masked = payload.clone();
    if masked.get("password").is_some() {
        masked["password"] = Value::String("***".to_string());
    }
    if let Some(auth) = masked.pointer_mut("/config/auth") {
        auth["pass"] = Value::String("***".to_string());
    }
    masked
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl DeviceDialect for Gen2Dialect {
    fn generation(&self) -> Generation {
        Generation::Gen2
    }

    async fn detect(&self, ip: Ipv4Addr) -> Result<DeviceRecord> {
        let info: DeviceInfo = self
            .http
            .fetch_json(self.http.probe_get(ip, DEVICE_INFO_PATH))
            .await?;
        let record = Self::base_record(ip, info);
        debug!("Found Gen2 Shelly device at {}: {}", ip, record.model_or_type);

        let enrichment = match (&self.credential, record.auth_enabled) {
            (Some(credential), true) => self.enrich(ip, credential).await,
            _ => None,
        };
        Ok(record.merge(enrichment))
    }

    async fn trigger_update(
        &self,
        ip: Ipv4Addr,
        credential: Option<&AdminCredential>,
    ) -> Result<()> {
        let payload = update_payload(credential);
        debug!("📤 {} {}", self.http.url(ip, UPDATE_PATH), masked(&payload));

        let reply = self
            .http
            .send_control(self.http.control_post(ip, UPDATE_PATH).json(&payload))
            .await
            .map_err(|e| ShellyError::UpdateFailed(e.to_string()))?;

        if reply.is_success() {
            info!("Gen2 update started on {}", ip);
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
        let payload = set_auth_payload(enable, credential, device.auth_enabled);
        debug!(
            "📤 {} {}",
            self.http.url(device.ip, SET_CONFIG_PATH),
            masked(&payload)
        );

        let reply = self
            .http
            .send_control(self.http.control_post(device.ip, SET_CONFIG_PATH).json(&payload))
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

    fn credential() -> AdminCredential {
        AdminCredential::new("s3cret").unwrap()
    }

    #[test]
    fn test_enable_payload_without_current_auth() {
        let payload = set_auth_payload(true, &credential(), false);
        assert_eq!(
            payload,
            json!({"config": {"auth": {"enable": true, "user": "admin", "pass": "s3cret"}}})
        );
    }

    #[test]
    fn test_disable_payload_carries_current_password() {
        let payload = set_auth_payload(false, &credential(), true);
        assert_eq!(payload["config"]["auth"]["pass"], "");
        assert_eq!(payload["config"]["auth"]["enable"], false);
        assert_eq!(payload["password"], "s3cret");
    }

    #[test]
    fn test_update_payload() {
        assert_eq!(update_payload(None), json!({"stage": "stable"}));
        assert_eq!(
            update_payload(Some(&credential())),
            json!({"stage": "stable", "password": "s3cret"})
        );
    }

    #[test]
    fn test_masked_hides_every_password() {
        let text = masked(&set_auth_payload(true, &credential(), true)).to_string();
        assert!(!text.contains("s3cret"));
        assert!(text.contains("***"));
    }

    #[test]
    fn test_base_record_fallbacks() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"model": "SNSW-001X16EU", "ver": "1.0.3", "name": null}"#)
                .unwrap();
        let record = Gen2Dialect::base_record(Ipv4Addr::new(10, 0, 0, 4), info);
        assert_eq!(record.display_name, "Shelly SNSW-001X16EU");
        assert_eq!(record.firmware_version, "1.0.3");
        assert_eq!(record.mac_address, UNKNOWN);
        assert!(!record.auth_enabled);
        assert_eq!(record.generation, Generation::Gen2);
    }

    #[test]
    fn test_base_record_prefers_fw_id_and_reported_name() {
        let info: DeviceInfo = serde_json::from_str(
            r#"{"model": "Plus1", "mac": "AABBCCDDEEFF", "auth_en": true,
                "fw_id": "20231107-164738/1.0.8-g8c7bb8d", "ver": "1.0.8", "name": "Porch"}"#,
        )
        .unwrap();
        let record = Gen2Dialect::base_record(Ipv4Addr::new(10, 0, 0, 5), info);
        assert_eq!(record.firmware_version, "20231107-164738/1.0.8-g8c7bb8d");
        assert_eq!(record.display_name, "Porch");
        assert!(record.auth_enabled);
    }
}
