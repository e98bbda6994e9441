//! Control routes: firmware update and authentication toggle

use log::{error, info};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

use super::{
    MAX_BODY_BYTES, body_limit, error_reply, internal_error_reply, isolated, json_reply, parse_ip,
    with_server_state,
};
use crate::models::{AuthRequest, AuthResponse, ErrorResponse, UpdateResponse};
use crate::server::app::ServerState;

/// Create all control routes
pub fn create_control_routes(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let update = update_route(state.clone());
    let auth = auth_route(state);

    warp::path("api").and(update.or(auth))
}

/// POST /api/update/{ip} - Trigger a firmware update
fn update_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("update")
        .and(warp::path::param::<String>())
        .and(warp::post())
        .and(warp::path::end())
        .and(with_server_state(state))
        .and_then(update_handler)
}

/// POST /api/auth/{ip} - Enable or disable the device login
fn auth_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("auth")
        .and(warp::path::param::<String>())
        .and(warp::post())
        .and(warp::path::end())
        .and(body_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_server_state(state))
        .and_then(auth_handler)
}

/// Handler for POST /api/update/{ip}
async fn update_handler(
    raw_ip: String,
    state: Arc<ServerState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ip = match parse_ip(&raw_ip) {
        Ok(ip) => ip,
        Err(e) => return Ok(error_reply(&e)),
    };
    info!("📥 Update request for {}", ip);
    let engine = state.engine.clone();

    match isolated(async move { engine.update(ip).await }).await {
        Ok(Ok(_)) => Ok(json_reply(
            &UpdateResponse {
                success: true,
                message: "Update started".to_string(),
            },
            StatusCode::OK,
        )),
        Ok(Err(e)) => {
            error!("❌ Update on {} failed: {}", ip, e);
            Ok(error_reply(&e))
        }
        Err(message) => Ok(internal_error_reply(message)),
    }
}

/// Handler for POST /api/auth/{ip}
async fn auth_handler(
    raw_ip: String,
    body: warp::hyper::body::Bytes,
    state: Arc<ServerState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let ip = match parse_ip(&raw_ip) {
        Ok(ip) => ip,
        Err(e) => return Ok(error_reply(&e)),
    };
    let request = match parse_auth_request(&body) {
        Ok(request) => request,
        Err(message) => {
            return Ok(json_reply(
                &ErrorResponse::new(message),
                StatusCode::BAD_REQUEST,
            ));
        }
    };
    info!(
        "📥 Auth toggle request for {}: {}",
        ip,
        if request.enable { "ENABLE" } else { "DISABLE" }
    );
    let engine = state.engine.clone();

    match isolated(async move { engine.set_auth(ip, request.enable).await }).await {
        Ok(Ok(changed)) => Ok(json_reply(
            &AuthResponse {
                success: true,
                auth_enabled: changed.state.is_enabled(),
                response: changed.device_response,
            },
            StatusCode::OK,
        )),
        Ok(Err(e)) => {
            error!("❌ Auth toggle on {} failed: {}", ip, e);
            Ok(error_reply(&e))
        }
        Err(message) => Ok(internal_error_reply(message)),
    }
}

/// Empty bodies mean `{"enable": false}`
fn parse_auth_request(body: &[u8]) -> Result<AuthRequest, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuthRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| format!("Invalid JSON body: {}", e))
}
