use crate::state::AppState;
use axum::Router;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const OIDC_TAG: &str = "OpenID Connect";

/// Document metadata; paths are collected from the routes in [`split_router`]
#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = OIDC_TAG, description = "OpenID Connect and OAuth 2.0 endpoints"),
    ),
    info(
        title = "OIDC Server API",
        description = "OpenID Provider backed by a hosted authorization engine",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

/// The API router and the OpenAPI document describing it
pub(crate) fn split_router() -> (Router<AppState>, utoipa::openapi::OpenApi) {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::api::router())
        .split_for_parts()
}
