//! Discovery document and JWK Set, served as the engine renders them

use crate::authlete::response;
use crate::errors::ApiError;
use crate::openapi::OIDC_TAG;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormatParams {
    /// Indent the JSON document (default: true)
    pub pretty: Option<bool>,
}

/// OpenID Provider metadata (OpenID Connect Discovery 1.0)
#[utoipa::path(
    get,
    path = "/.well-known/openid-configuration",
    tag = OIDC_TAG,
    params(FormatParams),
    responses(
        (status = 200, description = "OpenID Provider metadata"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn configuration(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
) -> Result<Response, ApiError> {
    let document = state
        .engine
        .service_configuration(params.pretty.unwrap_or(true))
        .await?;
    Ok(response::ok(Some(document)))
}

/// JWK Set of the service (RFC 7517)
#[utoipa::path(
    get,
    path = "/api/jwks",
    tag = OIDC_TAG,
    params(FormatParams),
    responses(
        (status = 200, description = "JSON Web Key Set"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn jwks(
    State(state): State<AppState>,
    Query(params): Query<FormatParams>,
) -> Result<Response, ApiError> {
    let document = state.engine.service_jwks(params.pretty.unwrap_or(true)).await?;
    Ok(response::ok(Some(document)))
}
