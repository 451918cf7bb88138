use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ServiceInfo {
    #[schema(example = "morpheo-storage")]
    pub service: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}
