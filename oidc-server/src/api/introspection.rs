//! Introspection endpoint (RFC 7662)

use crate::api::credentials::{encode_parameters, BasicCredentials};
use crate::authlete::response;
use crate::errors::ApiError;
use crate::openapi::OIDC_TAG;
use crate::state::AppState;
use axum::extract::{Form, State};
use axum::response::Response;
use http::HeaderMap;
use log::{debug, warn};

const CHALLENGE: &str = r#"Basic realm="/api/introspection""#;

/// Demo policy: any Basic credentials are accepted, except for the user "nobody"
fn is_authorized_caller(credentials: Option<&BasicCredentials>) -> bool {
    credentials.is_some_and(|c| !c.user_id.is_empty() && c.user_id != "nobody")
}

#[utoipa::path(
    post,
    path = "/api/introspection",
    tag = OIDC_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Introspection request parameters"),
    responses(
        (status = 200, description = "Token information"),
        (status = 400, description = "Invalid introspection request"),
        (status = 401, description = "Caller is not allowed to introspect tokens"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn introspection(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let credentials = BasicCredentials::from_headers(&headers);
    if !is_authorized_caller(credentials.as_ref()) {
        warn!("Rejected introspection caller: {:?}", credentials.map(|c| c.user_id));
        return Ok(response::unauthorized(None, CHALLENGE));
    }

    let result = state.engine.introspection(encode_parameters(&params)).await?;
    debug!(
        "Introspection processed: action={:?}, result={}",
        result.action,
        result.result_message.as_deref().unwrap_or_default()
    );

    Ok(response::from_action(
        result.action,
        result.response_content,
        None,
        response::ok,
    ))
}
