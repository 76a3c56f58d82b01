pub(crate) mod authorization;
pub(crate) mod credentials;
pub(crate) mod decision;
pub(crate) mod discovery;
pub(crate) mod health;
pub(crate) mod introspection;
pub(crate) mod revocation;
pub(crate) mod token;

use crate::state::AppState;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Combines all API routes into a single router
pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(health::router())
        .merge(oidc_routes())
}

/// Endpoints of the OpenID Provider
fn oidc_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            authorization::authorization_get,
            authorization::authorization_post
        ))
        .routes(routes!(decision::authorization_decision))
        .routes(routes!(token::token))
        .routes(routes!(introspection::introspection))
        .routes(routes!(revocation::revocation))
        .routes(routes!(discovery::jwks))
        .routes(routes!(discovery::configuration))
}
