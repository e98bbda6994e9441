//! Firmware update and auth toggle tests against mock devices


use mock_devices::*;
use serde_json::json;
use shelly_scanner::discovery::ShellyEngine;
use shelly_scanner::errors::ShellyError;
use shelly_scanner::models::{AuthState, ControlOperation, ControlOutcome, Generation};
use std::net::Ipv4Addr;

#[tokio::test]
async fn test_set_auth_without_password_sends_nothing() {
    let device = MockDeviceBuilder::gen1("SHSW-1", "AABBCC000001", false)
        .spawn(Ipv4Addr::new(127, 51, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "")).unwrap();

    let err = engine.set_auth(device.ip(), true).await.unwrap_err();

    assert!(matches!(err, ShellyError::CredentialsNotConfigured));
    assert_eq!(err.http_status(), 400);
    assert_eq!(device.request_count(), 0);
}

#[tokio::test]
async fn test_gen1_disable_uses_existing_login() {
    let device = MockDeviceBuilder::gen1("SHSW-1", "AABBCC000002", true)
        .route("/settings", MockResponse::json(json!({"name": "Porch"})))
        .route(
            "/settings/login",
            MockResponse::json(json!({"enabled": false, "unprotected": true, "username": "admin"})),
        )
        .spawn(Ipv4Addr::new(127, 52, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let changed = engine.set_auth(device.ip(), false).await.unwrap();

    assert_eq!(changed.state, AuthState::Disabled);
    assert_eq!(
        changed.device_response,
        Some(json!({"enabled": false, "unprotected": true, "username": "admin"}))
    );
    let login = device.requests_to("/settings/login");
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].method, "GET");
    assert_eq!(login[0].authorization.as_deref(), Some(ADMIN_SECRET_BASIC));
    assert_eq!(login[0].query_param("enabled").as_deref(), Some("0"));
    assert_eq!(login[0].query_param("username").as_deref(), Some("admin"));
    assert_eq!(login[0].query_param("password").as_deref(), Some(""));
}

#[tokio::test]
async fn test_gen1_enable_on_protected_device_uses_existing_login() {
    let device = MockDeviceBuilder::gen1("SHSW-25", "AABBCC00000A", true)
        .route("/settings", MockResponse::json(json!({"name": "Garage"})))
        .route("/settings/login", MockResponse::json(json!({"enabled": true})))
        .spawn(Ipv4Addr::new(127, 60, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let changed = engine.set_auth(device.ip(), true).await.unwrap();

    assert_eq!(changed.state, AuthState::Enabled);
    let login = device.requests_to("/settings/login");
    assert_eq!(login.len(), 1);
    assert_eq!(login[0].authorization.as_deref(), Some(ADMIN_SECRET_BASIC));
    assert_eq!(login[0].query_param("enabled").as_deref(), Some("1"));
    assert_eq!(login[0].query_param("username").as_deref(), Some("admin"));
    assert_eq!(login[0].query_param("password").as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_gen1_enable_on_open_device_is_unauthenticated() {
    let device = MockDeviceBuilder::gen1("SHPLG-S", "AABBCC000003", false)
        .route("/settings/login", MockResponse::json(json!({"enabled": true})))
        .spawn(Ipv4Addr::new(127, 53, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let changed = engine.set_auth(device.ip(), true).await.unwrap();

    assert_eq!(changed.state, AuthState::Enabled);
    let login = device.requests_to("/settings/login");
    assert_eq!(login.len(), 1);
    assert!(login[0].authorization.is_none());
    assert_eq!(login[0].query_param("enabled").as_deref(), Some("1"));
    assert_eq!(login[0].query_param("password").as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_gen2_toggle_carries_current_password_when_protected() {
    let device = MockDeviceBuilder::gen2("SNSW-001P16EU", "A8032ABE0004", true)
        .route(
            "/rpc/Shelly.GetConfig",
            MockResponse::json(json!({"sys": {"device": {"name": "Hall"}}})),
        )
        .route(
            "/rpc/Sys.SetConfig",
            MockResponse::json(json!({"restart_required": true})),
        )
        .spawn(Ipv4Addr::new(127, 54, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let changed = engine.set_auth(device.ip(), false).await.unwrap();

    assert_eq!(changed.state, AuthState::Disabled);
    assert_eq!(changed.device_response, Some(json!({"restart_required": true})));
    let set_config = device.requests_to("/rpc/Sys.SetConfig");
    assert_eq!(set_config.len(), 1);
    assert_eq!(set_config[0].method, "POST");
    let body = set_config[0].json_body();
    assert_eq!(body["password"], "secret");
    assert_eq!(body["config"]["auth"]["enable"], false);
    assert_eq!(body["config"]["auth"]["user"], "admin");
    assert_eq!(body["config"]["auth"]["pass"], "");
}

#[tokio::test]
async fn test_gen2_enable_on_open_device_omits_current_password() {
    let device = MockDeviceBuilder::gen2("SNSW-001P16EU", "A8032ABE0005", false)
        .route("/rpc/Sys.SetConfig", MockResponse::json(json!({})))
        .spawn(Ipv4Addr::new(127, 55, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    engine.set_auth(device.ip(), true).await.unwrap();

    let body = device.requests_to("/rpc/Sys.SetConfig")[0].json_body();
    assert!(body.get("password").is_none());
    assert_eq!(body["config"]["auth"]["enable"], true);
    assert_eq!(body["config"]["auth"]["pass"], "secret");
}

#[tokio::test]
async fn test_auth_rejection_keeps_device_body() {
    let device = MockDeviceBuilder::gen2("SNSW-001P16EU", "A8032ABE0006", false)
        .route(
            "/rpc/Sys.SetConfig",
            MockResponse::status(500).with_body(r#"{"code":-103,"message":"Invalid argument"}"#),
        )
        .spawn(Ipv4Addr::new(127, 56, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let err = engine.set_auth(device.ip(), true).await.unwrap_err();

    match &err {
        ShellyError::AuthToggleFailed { reason, details } => {
            assert!(reason.contains("500"));
            assert_eq!(
                details.as_deref(),
                Some(r#"{"code":-103,"message":"Invalid argument"}"#)
            );
        }
        other => panic!("expected AuthToggleFailed, got {:?}", other),
    }
    assert_eq!(err.http_status(), 500);
}

#[tokio::test]
async fn test_gen2_update_posts_stable_stage() {
    let device = MockDeviceBuilder::gen2("SNSW-001P16EU", "A8032ABE0007", false)
        .route("/rpc/Shelly.Update", MockResponse::json(json!(null)))
        .spawn(Ipv4Addr::new(127, 57, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "")).unwrap();

    let started = engine.update(device.ip()).await.unwrap();

    assert_eq!(started.ip, device.ip());
    assert_eq!(started.generation, Generation::Gen2);
    let update = device.requests_to("/rpc/Shelly.Update");
    assert_eq!(update.len(), 1);
    assert_eq!(update[0].method, "POST");
    assert_eq!(update[0].json_body(), json!({"stage": "stable"}));
}

#[tokio::test]
async fn test_gen1_update_uses_ota_with_credential() {
    let device = MockDeviceBuilder::gen1("SHSW-1", "AABBCC000008", true)
        .route("/ota", MockResponse::json(json!({"status": "updating"})))
        .spawn(Ipv4Addr::new(127, 58, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "secret")).unwrap();

    let outcome = engine
        .dispatcher()
        .execute(engine.dispatcher().request(device.ip(), ControlOperation::UpdateFirmware))
        .await
        .unwrap();

    match outcome {
        ControlOutcome::UpdateStarted(started) => {
            assert_eq!(started.generation, Generation::Gen1)
        }
        other => panic!("expected UpdateStarted, got {:?}", other),
    }
    let ota = device.requests_to("/ota");
    assert_eq!(ota.len(), 1);
    assert_eq!(ota[0].query_param("update").as_deref(), Some("true"));
    assert_eq!(ota[0].authorization.as_deref(), Some(ADMIN_SECRET_BASIC));
}

#[tokio::test]
async fn test_update_failure_reports_status() {
    let device = MockDeviceBuilder::gen1("SHSW-1", "AABBCC000009", false)
        .route("/ota", MockResponse::status(503))
        .spawn(Ipv4Addr::new(127, 59, 0, 1), 0)
        .await;
    let engine = ShellyEngine::new(&test_config(device.port(), "")).unwrap();

    let err = engine.update(device.ip()).await.unwrap_err();

    assert!(matches!(err, ShellyError::UpdateFailed(_)));
    assert_eq!(err.to_string(), "Update failed: Request failed with status 503");
}

#[tokio::test]
async fn test_control_on_empty_address_is_device_not_found() {
    let ip = Ipv4Addr::new(127, 59, 0, 2);
    let port = {
        let listener = std::net::TcpListener::bind((ip, 0)).unwrap();
        listener.local_addr().unwrap().port()
    };
    let engine = ShellyEngine::new(&test_config(port, "secret")).unwrap();

    let update = engine.update(ip).await.unwrap_err();
    let auth = engine.set_auth(ip, true).await.unwrap_err();

    assert!(matches!(update, ShellyError::DeviceNotFound(found) if found == ip));
    assert!(matches!(auth, ShellyError::DeviceNotFound(_)));
    assert_eq!(update.http_status(), 404);
    assert_eq!(update.to_string(), "Device not found");
}
