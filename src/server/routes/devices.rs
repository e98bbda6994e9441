//! Discovery routes

use log::info;
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

use super::{error_reply, internal_error_reply, isolated, json_reply, parse_ip, with_server_state};
use crate::errors::ShellyError;
use crate::models::ProbeOutcome;
use crate::server::app::ServerState;

/// Create all discovery routes
pub fn create_device_routes(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let scan = scan_route(state.clone());
    let device_info = device_info_route(state);

    warp::path("api").and(scan.or(device_info))
}

/// GET /api/scan - Sweep the subnet
fn scan_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("scan")
        .and(warp::get())
        .and(warp::path::end())
        .and(with_server_state(state))
        .and_then(scan_handler)
}

/// GET /api/device/{ip} - Probe one address
fn device_info_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("device")
        .and(warp::path::param::<String>())
        .and(warp::get())
        .and(warp::path::end())
        .and(with_server_state(state))
        .and_then(device_info_handler)
}

/// Handler for GET /api/scan
async fn scan_handler(state: Arc<ServerState>) -> Result<impl warp::Reply, warp::Rejection> {
    let engine = state.engine.clone();

    match isolated(async move { engine.scan().await }).await {
        Ok(devices) => {
            info!("📡 Scan returned {} device(s)", devices.len());
            Ok(json_reply(&devices, StatusCode::OK))
        }
        Err(message) => Ok(internal_error_reply(message)),
    }
}

/// Handler for GET /api/device/{ip}
async fn device_info_handler(
    raw_ip: String,
    state: Arc<ServerState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ip = match parse_ip(&raw_ip) {
        Ok(ip) => ip,
        Err(e) => return Ok(error_reply(&e)),
    };
    let engine = state.engine.clone();

    match isolated(async move { engine.probe(ip).await }).await {
        Ok(ProbeOutcome::Found(device)) => Ok(json_reply(&device, StatusCode::OK)),
        Ok(ProbeOutcome::NotFound) | Ok(ProbeOutcome::Errored(_)) => {
            Ok(error_reply(&ShellyError::DeviceNotFound(ip)))
        }
        Err(message) => Ok(internal_error_reply(message)),
    }
}
