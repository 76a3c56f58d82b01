//! Authorization endpoint (OpenID Connect Core 3.1.2.1)

use crate::api::credentials::encode_parameters;
use crate::authlete::models::{Action, AuthorizationResponse};
use crate::authlete::response;
use crate::consent::{self, page, AuthorizationContext, ClaimResolver, Decision};
use crate::errors::ApiError;
use crate::headers::presets;
use crate::openapi::OIDC_TAG;
use crate::session::{PendingAuthorization, Session};
use crate::state::AppState;
use axum::extract::{Form, RawQuery, State};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use log::{debug, info};

/// Authorization request via GET (parameters in the query string)
#[utoipa::path(
    get,
    path = "/api/authorization",
    tag = OIDC_TAG,
    responses(
        (status = 200, description = "Consent page or form post back to the client"),
        (status = 302, description = "Redirect back to the client"),
        (status = 400, description = "Invalid authorization request"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn authorization_get(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Response {
    handle(&state, session, query.unwrap_or_default()).await
}

/// Authorization request via POST (parameters in the form body)
#[utoipa::path(
    post,
    path = "/api/authorization",
    tag = OIDC_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Authorization request parameters"),
    responses(
        (status = 200, description = "Consent page or form post back to the client"),
        (status = 302, description = "Redirect back to the client"),
        (status = 400, description = "Invalid authorization request"),
        (status = 502, description = "Authorization engine unreachable")
    )
)]
pub async fn authorization_post(
    State(state): State<AppState>,
    session: Session,
    Form(params): Form<Vec<(String, String)>>,
) -> Response {
    handle(&state, session, encode_parameters(&params)).await
}

async fn handle(state: &AppState, mut session: Session, parameters: String) -> Response {
    let result = process(state, &mut session, parameters).await;
    session
        .finish(result.unwrap_or_else(IntoResponse::into_response))
        .await
}

async fn process(
    state: &AppState,
    session: &mut Session,
    parameters: String,
) -> Result<Response, ApiError> {
    let response = state.engine.authorization(parameters).await?;
    debug!(
        "Authorization request processed: action={:?}, result={}",
        response.action,
        response.result_message.as_deref().unwrap_or_default()
    );

    match response.action {
        Action::Interaction => interaction(state, session, response).await,
        Action::NoInteraction => no_interaction(state, session, response).await,
        action => Ok(response::from_action(
            action,
            response.response_content,
            None,
            response::ok,
        )),
    }
}

fn context_from(response: AuthorizationResponse) -> Result<AuthorizationContext, ApiError> {
    AuthorizationContext::from_response(response)
        .ok_or_else(|| ApiError::bad_gateway("Authorization engine returned no ticket"))
}

/// Show the consent page, with a login form when the user has to log in
async fn interaction(
    state: &AppState,
    session: &mut Session,
    response: AuthorizationResponse,
) -> Result<Response, ApiError> {
    let context = context_from(response)?;
    let outcome = consent::decide(&session.auth_state(), &context, Utc::now(), &state.users);

    if let Some(reason) = outcome.login_reason {
        debug!("Login required: {:?}", reason);
    }

    if outcome.invalidate_session {
        info!("Logging out user {:?} before re-authentication", session.user_id());
        session.logout();
    }

    if let Some(reason) = outcome.fail_reason {
        debug!("Failing authorization request: {:?}", reason);
        session.clear_authorization();
        let result = state.engine.authorization_fail(&context.ticket, reason).await?;
        return Ok(response::authorization_result(result));
    }

    let model = outcome
        .model
        .ok_or_else(|| ApiError::internal("No consent page to render"))?;

    session.store_authorization(context.ticket, context.claim_names, context.claim_locales);

    let mut page = Html(page::render(&model)).into_response();
    presets::private_no_store().apply(&mut page);
    Ok(page)
}

/// Complete a `prompt=none` request with the current login, or fail it
async fn no_interaction(
    state: &AppState,
    session: &Session,
    response: AuthorizationResponse,
) -> Result<Response, ApiError> {
    let context = context_from(response)?;
    let auth_state = session.auth_state();

    if let Err(reason) = consent::check_no_interaction(&auth_state, &context, Utc::now()) {
        debug!("Failing request without interaction: {:?}", reason);
        let result = state.engine.authorization_fail(&context.ticket, reason).await?;
        return Ok(response::authorization_result(result));
    }

    let decision = Decision::new(
        PendingAuthorization {
            ticket: context.ticket,
            claim_names: context.claim_names,
            claim_locales: context.claim_locales,
        },
        true,
    );
    let resolver = ClaimResolver::new(&state.users);
    Ok(consent::submit(&state.engine, decision, &auth_state, &resolver).await?)
}
