//! Turning engine actions into HTTP responses
//!
//! Every response built here carries `Cache-Control: no-store` and
//! `Pragma: no-cache`, since the content may hold tokens or codes.

use super::models::{Action, EngineResponse};
use crate::headers::presets;
use axum::body::Body;
use axum::response::Response;
use http::header::{CONTENT_TYPE, LOCATION, WWW_AUTHENTICATE};
use http::{HeaderValue, StatusCode};
use log::warn;

const JSON: &str = "application/json;charset=UTF-8";
const HTML: &str = "text/html;charset=UTF-8";
const JAVASCRIPT: &str = "application/javascript;charset=UTF-8";

fn content_response(status: StatusCode, content_type: &'static str, content: Option<String>) -> Response {
    let mut response = Response::new(Body::from(content.unwrap_or_default()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    presets::no_store().apply(&mut response);
    response
}

/// 200 OK with a JSON body
pub fn ok(content: Option<String>) -> Response {
    content_response(StatusCode::OK, JSON, content)
}

/// 200 OK with a JavaScript body (revocation responses)
pub fn ok_javascript(content: Option<String>) -> Response {
    content_response(StatusCode::OK, JAVASCRIPT, content)
}

/// 200 OK with an HTML form that posts the result back to the client
pub fn form(content: Option<String>) -> Response {
    content_response(StatusCode::OK, HTML, content)
}

pub fn bad_request(content: Option<String>) -> Response {
    content_response(StatusCode::BAD_REQUEST, JSON, content)
}

pub fn internal_server_error(content: Option<String>) -> Response {
    content_response(StatusCode::INTERNAL_SERVER_ERROR, JSON, content)
}

/// 401 Unauthorized with a `WWW-Authenticate` challenge
pub fn unauthorized(content: Option<String>, challenge: &str) -> Response {
    let mut response = content_response(StatusCode::UNAUTHORIZED, JSON, content);
    if let Ok(value) = HeaderValue::from_str(challenge) {
        response.headers_mut().insert(WWW_AUTHENTICATE, value);
    }
    response
}

pub fn forbidden(content: Option<String>) -> Response {
    content_response(StatusCode::FORBIDDEN, JSON, content)
}

/// 302 Found redirecting to the engine-provided URL
pub fn location(content: Option<String>) -> Response {
    let mut response = content_response(StatusCode::FOUND, HTML, None);
    match content.as_deref().map(HeaderValue::from_str) {
        Some(Ok(value)) => {
            response.headers_mut().insert(LOCATION, value);
            response
        }
        _ => internal_server_error(None),
    }
}

/// Map an engine response to HTTP
///
/// `challenge` is the `WWW-Authenticate` value for INVALID_CLIENT when the
/// client authenticated with HTTP Basic; without it INVALID_CLIENT becomes 400.
/// `ok_response` renders the OK action, which differs between endpoints.
pub fn from_action(
    action: Action,
    content: Option<String>,
    challenge: Option<&str>,
    ok_response: fn(Option<String>) -> Response,
) -> Response {
    match action {
        Action::InternalServerError => internal_server_error(content),
        Action::BadRequest => bad_request(content),
        Action::InvalidClient | Action::Unauthorized => match challenge {
            Some(challenge) => unauthorized(content, challenge),
            None => bad_request(content),
        },
        Action::Forbidden => forbidden(content),
        Action::Location => location(content),
        Action::Form => form(content),
        Action::Ok => ok_response(content),
        other => {
            warn!("Unexpected engine action: {:?}", other);
            internal_server_error(None)
        }
    }
}

/// Map the result of an authorization issue/fail call
pub fn authorization_result(response: EngineResponse) -> Response {
    from_action(response.action, response.response_content, None, ok)
}
