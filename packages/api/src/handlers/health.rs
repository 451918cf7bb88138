use axum::Json;

use crate::models::health::{HealthResponse, ServiceInfo};

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "serviceInfo",
    summary = "Service name and version",
    responses((status = 200, description = "Service is up", body = ServiceInfo)),
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "morpheo-storage",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness probe",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
