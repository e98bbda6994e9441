//! HTTP routes for the scanner API

pub mod control;
pub mod devices;
pub mod health;

use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::errors::ShellyError;
use crate::models::ErrorResponse;
use crate::server::app::ServerState;

/// Largest request body a handler will buffer
pub const MAX_BODY_BYTES: u64 = 4 * 1024;

/// Request body refused before it is read
#[derive(Debug)]
pub(crate) enum BodyRejection {
    TooLarge(u64),
    LengthRequired,
}

impl warp::reject::Reject for BodyRejection {}

/// Create all server routes, with rejections turned into JSON errors
pub fn create_routes(
    state: Arc<ServerState>,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    devices::create_device_routes(state.clone())
        .or(control::create_control_routes(state))
        .or(health::create_health_route())
        .recover(handle_rejection)
}

/// Helper function to pass server state to handlers
pub(crate) fn with_server_state(
    state: Arc<ServerState>,
) -> impl Filter<Extract = (Arc<ServerState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// Refuse bodies over `limit` bytes, and streamed bodies without a length
///
/// Requests carrying no body at all pass, unlike
/// `warp::body::content_length_limit`, which insists on the header.
pub(crate) fn body_limit(
    limit: u64,
) -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and(warp::header::optional::<String>("transfer-encoding"))
        .and_then(
            move |length: Option<u64>, encoding: Option<String>| async move {
                match (length, encoding) {
                    (Some(length), _) if length > limit => {
                        Err(warp::reject::custom(BodyRejection::TooLarge(length)))
                    }
                    (None, Some(_)) => Err(warp::reject::custom(BodyRejection::LengthRequired)),
                    _ => Ok(()),
                }
            },
        )
        .untuple_one()
}

pub(crate) fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

pub(crate) fn error_reply(err: &ShellyError) -> WithStatus<Json> {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_reply(&ErrorResponse::from(err), status)
}

pub(crate) fn internal_error_reply(message: String) -> WithStatus<Json> {
    json_reply(
        &ErrorResponse::new(message),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

pub(crate) fn parse_ip(raw: &str) -> Result<Ipv4Addr, ShellyError> {
    raw.parse()
        .map_err(|_| ShellyError::InvalidAddress(raw.to_string()))
}

/// Run engine work on its own task so a panic becomes an error message
/// instead of a dropped connection
pub(crate) async fn isolated<F, T>(work: F) -> Result<T, String>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work).await.map_err(|e| {
        if e.is_panic() {
            let payload = e.into_panic();
            if let Some(message) = payload.downcast_ref::<&str>() {
                message.to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "internal error".to_string()
            }
        } else {
            e.to_string()
        }
    })
}

/// Turn any rejection into a JSON error body
async fn handle_rejection(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(rejection) = err.find::<BodyRejection>() {
        match rejection {
            BodyRejection::TooLarge(length) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Request body of {} bytes exceeds {} bytes",
                    length, MAX_BODY_BYTES
                ),
            ),
            BodyRejection::LengthRequired => (
                StatusCode::LENGTH_REQUIRED,
                "Content-Length required".to_string(),
            ),
        }
    } else if err.find::<warp::reject::InvalidHeader>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid request header".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{:?}", err),
        )
    };

    Ok(json_reply(&ErrorResponse::new(message), status))
}
