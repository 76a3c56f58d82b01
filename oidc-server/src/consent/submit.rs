//! Sending the user's consent decision to the engine

use super::claims::{collect_claims, ClaimResolver};
use crate::authlete::models::{AuthorizationFailReason, AuthorizationIssueRequest};
use crate::authlete::{response, AuthleteClient, EngineError};
use crate::session::{AuthenticationState, PendingAuthorization};
use axum::response::Response;
use log::debug;

/// The user's answer on the consent page
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub ticket: String,
    pub authorized: bool,
    pub claim_names: Vec<String>,
    pub claim_locales: Vec<String>,
}

impl Decision {
    pub fn new(pending: PendingAuthorization, authorized: bool) -> Self {
        Self {
            ticket: pending.ticket,
            authorized,
            claim_names: pending.claim_names,
            claim_locales: pending.claim_locales,
        }
    }
}

/// Report the decision to the engine and relay its answer
///
/// Makes exactly one call: a failure (`DENIED` or `NOT_AUTHENTICATED`) or an
/// issue request for the logged-in user.
pub async fn submit(
    engine: &AuthleteClient,
    decision: Decision,
    auth_state: &AuthenticationState,
    resolver: &ClaimResolver<'_>,
) -> Result<Response, EngineError> {
    if !decision.authorized {
        debug!("User denied the authorization request");
        let result = engine
            .authorization_fail(&decision.ticket, AuthorizationFailReason::Denied)
            .await?;
        return Ok(response::authorization_result(result));
    }

    let Some(subject) = auth_state.user_id.as_deref() else {
        debug!("Authorization approved without an authenticated user");
        let result = engine
            .authorization_fail(&decision.ticket, AuthorizationFailReason::NotAuthenticated)
            .await?;
        return Ok(response::authorization_result(result));
    };

    let request = AuthorizationIssueRequest {
        ticket: decision.ticket,
        subject: subject.to_string(),
        auth_time: auth_state
            .authenticated_at
            .map(|at| at.timestamp())
            .unwrap_or(0),
        claims: collect_claims(
            resolver,
            subject,
            &decision.claim_names,
            &decision.claim_locales,
        ),
    };

    debug!("Issuing authorization for subject: {}", subject);
    let result = engine.authorization_issue(&request).await?;
    Ok(response::authorization_result(result))
}
