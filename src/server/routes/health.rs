//! Health check route

use warp::Filter;

use crate::models::HealthResponse;

/// Create health check route
pub fn create_health_route()
-> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("health")
        .and(warp::get())
        .and(warp::path::end())
        .map(|| warp::reply::json(&HealthResponse::ok()))
}
