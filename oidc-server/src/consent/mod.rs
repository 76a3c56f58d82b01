//! Interactive authorization
//!
//! [`decide`] runs the rules that settle whether the user has to log in again
//! before consenting, and builds the model of the consent page.

use crate::authlete::models::{
    AuthorizationFailReason, AuthorizationResponse, Client, Prompt, Scope, Service,
};
use crate::identity::UserStore;
use crate::session::AuthenticationState;
use chrono::{DateTime, Utc};

pub mod claims;
pub mod page;
pub mod submit;

pub use claims::ClaimResolver;
pub use submit::{submit, Decision};

/// The parts of the engine's authorization response the consent flow needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationContext {
    pub ticket: String,
    /// Subject the client demands (`sub` in the `claims` request parameter)
    pub required_subject: Option<String>,
    pub prompts: Vec<Prompt>,
    /// Seconds; zero or less means unset
    pub max_age: i64,
    pub login_hint: Option<String>,
    pub scopes: Vec<Scope>,
    pub claim_names: Vec<String>,
    pub claim_locales: Vec<String>,
    pub acrs: Vec<String>,
    pub acr_essential: bool,
    pub client: Client,
    pub service: Service,
}

impl AuthorizationContext {
    /// Returns None when the engine issued no ticket
    pub fn from_response(response: AuthorizationResponse) -> Option<Self> {
        Some(Self {
            ticket: response.ticket?,
            required_subject: response.subject,
            prompts: response.prompts.unwrap_or_default(),
            max_age: response.max_age,
            login_hint: response.login_hint,
            scopes: response.scopes.unwrap_or_default(),
            claim_names: response.claims.unwrap_or_default(),
            claim_locales: response.claims_locales.unwrap_or_default(),
            acrs: response.acrs.unwrap_or_default(),
            acr_essential: response.acr_essential,
            client: response.client.unwrap_or_default(),
            service: response.service.unwrap_or_default(),
        })
    }

    fn has_prompt(&self, prompt: Prompt) -> bool {
        self.prompts.contains(&prompt)
    }
}

/// Everything the consent page shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsentPageModel {
    pub service_name: Option<String>,
    pub client_name: Option<String>,
    pub description: Option<String>,
    pub logo_uri: Option<String>,
    pub client_uri: Option<String>,
    pub policy_uri: Option<String>,
    pub tos_uri: Option<String>,
    pub scopes: Vec<Scope>,
    pub login_id: String,
    pub login_id_read_only: bool,
    /// Greeting name of the logged-in user
    pub user_name: Option<String>,
    pub login_required: bool,
}

impl ConsentPageModel {
    fn new(context: &AuthorizationContext) -> Self {
        Self {
            service_name: context.service.service_name.clone(),
            client_name: context.client.client_name.clone(),
            description: context.client.description.clone(),
            logo_uri: context.client.logo_uri.clone(),
            client_uri: context.client.client_uri.clone(),
            policy_uri: context.client.policy_uri.clone(),
            tos_uri: context.client.tos_uri.clone(),
            scopes: context.scopes.clone(),
            ..Default::default()
        }
    }
}

/// Why the user has to log in before consenting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    NotLoggedIn,
    PromptLogin,
    SubjectMismatch,
    MaxAgeExceeded,
}

impl LoginReason {
    /// Whether the current login has to be dropped
    pub fn invalidates_session(self) -> bool {
        !matches!(self, Self::NotLoggedIn)
    }
}

/// Result of [`decide`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionOutcome {
    /// Reuse the current identity; the page is rendered without a login form
    pub skip_interaction: bool,
    /// The caller must log the user out before rendering
    pub invalidate_session: bool,
    pub login_reason: Option<LoginReason>,
    pub model: Option<ConsentPageModel>,
    /// Set when the request cannot proceed; report it to the engine
    pub fail_reason: Option<AuthorizationFailReason>,
}

/// Whether the last login is older than `max_age` seconds
///
/// A `max_age` of zero or less is unset. A login exactly `max_age` seconds old
/// is still valid. An unknown login time counts as the Unix epoch.
pub fn max_age_exceeded(auth_state: &AuthenticationState, max_age: i64, now: DateTime<Utc>) -> bool {
    if max_age <= 0 {
        return false;
    }
    let authenticated_at = auth_state
        .authenticated_at
        .map(|at| at.timestamp())
        .unwrap_or(0);
    now.timestamp() - authenticated_at > max_age
}

/// The first rule that forces a new login, if any
pub fn login_reason(
    auth_state: &AuthenticationState,
    context: &AuthorizationContext,
    now: DateTime<Utc>,
) -> Option<LoginReason> {
    let Some(user_id) = auth_state.user_id.as_deref() else {
        return Some(LoginReason::NotLoggedIn);
    };
    if context.has_prompt(Prompt::Login) {
        return Some(LoginReason::PromptLogin);
    }
    if context
        .required_subject
        .as_deref()
        .is_some_and(|subject| subject != user_id)
    {
        return Some(LoginReason::SubjectMismatch);
    }
    if max_age_exceeded(auth_state, context.max_age, now) {
        return Some(LoginReason::MaxAgeExceeded);
    }
    None
}

/// Decide how the consent page is presented for an interactive request
pub fn decide(
    auth_state: &AuthenticationState,
    context: &AuthorizationContext,
    now: DateTime<Utc>,
    users: &UserStore,
) -> InteractionOutcome {
    let mut model = ConsentPageModel::new(context);

    let Some(reason) = login_reason(auth_state, context, now) else {
        model.user_name = auth_state
            .user_id
            .as_deref()
            .and_then(|id| users.find(id))
            .and_then(|user| user.given_name);
        return InteractionOutcome {
            skip_interaction: true,
            model: Some(model),
            ..Default::default()
        };
    };

    let mut outcome = InteractionOutcome {
        invalidate_session: reason.invalidates_session(),
        login_reason: Some(reason),
        ..Default::default()
    };

    model.login_required = true;
    match context.required_subject.as_deref() {
        Some(subject) => match users.find(subject) {
            Some(user) => {
                model.login_id = user.username;
                model.login_id_read_only = true;
            }
            None => {
                outcome.fail_reason = Some(AuthorizationFailReason::NotAuthenticated);
                return outcome;
            }
        },
        None => model.login_id = context.login_hint.clone().unwrap_or_default(),
    }

    outcome.model = Some(model);
    outcome
}

/// Checks for a request that must complete without user interaction
/// (`prompt=none`), returning the subject to issue for
pub fn check_no_interaction<'a>(
    auth_state: &'a AuthenticationState,
    context: &AuthorizationContext,
    now: DateTime<Utc>,
) -> Result<&'a str, AuthorizationFailReason> {
    let user_id = auth_state
        .user_id
        .as_deref()
        .ok_or(AuthorizationFailReason::NotLoggedIn)?;

    if max_age_exceeded(auth_state, context.max_age, now) {
        return Err(AuthorizationFailReason::ExceedsMaxAge);
    }

    if context
        .required_subject
        .as_deref()
        .is_some_and(|subject| subject != user_id)
    {
        return Err(AuthorizationFailReason::DifferentSubject);
    }

    // Password logins carry no authentication context class
    if context.acr_essential && !context.acrs.is_empty() {
        return Err(AuthorizationFailReason::AcrNotSatisfied);
    }

    Ok(user_id)
}
