//! Revocation endpoint (RFC 7009)

use crate::api::credentials::{encode_parameters, BasicCredentials};
use crate::authlete::models::RevocationRequest;
use crate::authlete::response;
use crate::errors::ApiError;
use crate::openapi::OIDC_TAG;
use crate::state::AppState;
use axum::extract::{Form, State};
use axum::response::Response;
use http::HeaderMap;
use log::debug;

const CHALLENGE: &str = r#"Basic realm="/api/revocation""#;

#[utoipa::path(
    post,
    path = "/api/revocation",
    tag = OIDC_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Revocation request parameters"),
    responses(
        (status = 200, description = "Token revoked"),
        (status = 400, description = "Invalid revocation request"),
        (status = 401, description = "Client authentication failed"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn revocation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let credentials = BasicCredentials::from_headers(&headers);
    let challenge = credentials.is_some().then_some(CHALLENGE);

    let request = RevocationRequest {
        parameters: encode_parameters(&params),
        client_id: credentials.as_ref().map(|c| c.user_id.clone()),
        client_secret: credentials.and_then(|c| c.password),
    };

    let result = state.engine.revocation(&request).await?;
    debug!(
        "Revocation processed: action={:?}, result={}",
        result.action,
        result.result_message.as_deref().unwrap_or_default()
    );

    Ok(response::from_action(
        result.action,
        result.response_content,
        challenge,
        response::ok_javascript,
    ))
}
