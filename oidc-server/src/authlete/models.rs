//! Request and response bodies of the authorization engine API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the engine tells the caller to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    InternalServerError,
    BadRequest,
    InvalidClient,
    Unauthorized,
    Forbidden,
    Location,
    Form,
    NoInteraction,
    Interaction,
    Password,
    Ok,
    #[serde(other)]
    Unknown,
}

/// Values of the `prompt` request parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prompt {
    None,
    Login,
    Consent,
    SelectAccount,
    #[serde(other)]
    Other,
}

/// Why an authorization request could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationFailReason {
    Unknown,
    NotLoggedIn,
    MaxAgeNotSupported,
    ExceedsMaxAge,
    DifferentSubject,
    AcrNotSatisfied,
    Denied,
    ServerError,
    NotAuthenticated,
    AccountSelectionRequired,
    ConsentRequired,
    InteractionRequired,
    InvalidTarget,
}

/// Why a token request could not be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenFailReason {
    Unknown,
    InvalidResourceOwnerCredentials,
    InvalidTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub client_name: Option<String>,
    pub description: Option<String>,
    pub logo_uri: Option<String>,
    pub client_uri: Option<String>,
    pub policy_uri: Option<String>,
    pub tos_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Scope {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizationRequest {
    pub parameters: String,
}

/// Result of parsing an authorization request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResponse {
    pub result_message: Option<String>,
    pub action: Action,
    pub ticket: Option<String>,
    pub client: Option<Client>,
    pub service: Option<Service>,
    pub scopes: Option<Vec<Scope>>,
    pub subject: Option<String>,
    pub login_hint: Option<String>,
    pub prompts: Option<Vec<Prompt>>,
    #[serde(default)]
    pub max_age: i64,
    pub claims: Option<Vec<String>>,
    pub claims_locales: Option<Vec<String>>,
    /// Requested authentication context class references
    pub acrs: Option<Vec<String>>,
    #[serde(default)]
    pub acr_essential: bool,
    pub response_content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationIssueRequest {
    pub ticket: String,
    pub subject: String,
    /// Seconds since the Unix epoch
    pub auth_time: i64,
    /// JSON object of claim values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorizationFailRequest {
    pub ticket: String,
    pub reason: AuthorizationFailReason,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenIssueRequest {
    pub ticket: String,
    pub subject: String,
}

#[derive(Debug, Serialize)]
pub struct TokenFailRequest {
    pub ticket: String,
    pub reason: TokenFailReason,
}

#[derive(Debug, Serialize)]
pub struct IntrospectionRequest {
    pub parameters: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRequest {
    pub parameters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Response shape shared by the non-interactive engine operations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub result_message: Option<String>,
    pub action: Action,
    pub response_content: Option<String>,
    /// Token endpoint, PASSWORD action only
    pub ticket: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}
