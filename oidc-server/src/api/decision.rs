//! Receives the consent form

use crate::consent::{self, page, ClaimResolver, Decision};
use crate::errors::ApiError;
use crate::identity::CredentialVerifier;
use crate::openapi::OIDC_TAG;
use crate::session::Session;
use crate::state::AppState;
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashMap;

/// Authorization decision endpoint
///
/// Logs the user in from the form's credentials when needed, then reports the
/// decision for the ticket stored when the consent page was rendered.
#[utoipa::path(
    post,
    path = "/api/authorization/decision",
    tag = OIDC_TAG,
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Consent form: loginId, password and the pressed button"),
    responses(
        (status = 200, description = "Form post back to the client"),
        (status = 302, description = "Redirect back to the client"),
        (status = 400, description = "No authorization request is waiting for a decision"),
        (status = 502, description = "Authorization engine or identity provider unreachable")
    )
)]
pub async fn authorization_decision(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let result = process(&state, &mut session, &form).await;
    session
        .finish(result.unwrap_or_else(IntoResponse::into_response))
        .await
}

async fn process(
    state: &AppState,
    session: &mut Session,
    form: &HashMap<String, String>,
) -> Result<Response, ApiError> {
    if session.user_id().is_none() {
        login(state, session, form).await?;
    }

    let authorized = form.contains_key(page::AUTHORIZED_FIELD);

    let pending = session.take_authorization().await?.ok_or_else(|| {
        warn!("Decision received without a pending authorization request");
        ApiError::bad_request("No authorization request is waiting for a decision")
    })?;

    debug!("User decision: authorized={}", authorized);
    let resolver = ClaimResolver::new(&state.users);
    Ok(consent::submit(
        &state.engine,
        Decision::new(pending, authorized),
        &session.auth_state(),
        &resolver,
    )
    .await?)
}

/// Failed logins are not errors: the engine is then told nobody is authenticated
async fn login(
    state: &AppState,
    session: &mut Session,
    form: &HashMap<String, String>,
) -> Result<(), ApiError> {
    let (Some(login_id), Some(password)) = (
        form.get(page::LOGIN_ID_FIELD),
        form.get(page::PASSWORD_FIELD),
    ) else {
        return Ok(());
    };

    match state.verifier.verify(login_id, password).await? {
        Some(user) => {
            info!("User '{}' logged in", user.username);
            session.login(user.id, Utc::now());
        }
        None => warn!("Login failed for '{}'", login_id),
    }
    Ok(())
}
