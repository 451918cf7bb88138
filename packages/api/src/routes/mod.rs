use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{health, resource};
use crate::state::AppState;

/// Probes reachable without credentials.
pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health::root))
        .routes(routes!(health::health))
}

/// `/{kind}` routes for problems, data, algorithms and models. Every
/// handler takes the basic-auth extractor.
pub fn resource_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(resource::list_resources, resource::create_resource))
        .routes(routes!(resource::get_resource, resource::patch_resource))
        .routes(routes!(resource::get_resource_blob))
        .routes(routes!(resource::get_resource_description))
}
