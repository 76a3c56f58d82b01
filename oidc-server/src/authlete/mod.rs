//! Client for the hosted authorization engine

use crate::config::AuthleteConfig;
use crate::errors::ApiError;
use log::{debug, error};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub mod models;
pub mod response;

use models::*;

/// Errors that can occur when calling the authorization engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to send request to the authorization engine: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Authorization engine request failed with status: {0}")]
    InvalidStatus(StatusCode),
    #[error("Failed to parse authorization engine response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        error!("Authorization engine call failed: {}", err);
        match err {
            EngineError::RequestError(_) => {
                ApiError::bad_gateway("Failed to send request to the authorization engine")
            }
            EngineError::InvalidStatus(status) => ApiError::bad_gateway(format!(
                "Authorization engine request failed with status: {}",
                status
            )),
            EngineError::ParseError(e) => ApiError::bad_gateway(format!(
                "Failed to parse authorization engine response: {}",
                e
            )),
        }
    }
}

/// Typed HTTP client for the engine API, authenticated with the service credentials
#[derive(Clone)]
pub struct AuthleteClient {
    client: reqwest::Client,
    config: AuthleteConfig,
}

impl AuthleteClient {
    pub fn new(config: AuthleteConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self { client, config })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, EngineError> {
        let url = self.config.get_url(endpoint);
        debug!("Calling authorization engine at: {}", url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::InvalidStatus(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_raw(&self, endpoint: &str, pretty: bool) -> Result<String, EngineError> {
        let url = self.config.get_url(endpoint);
        debug!("Fetching from authorization engine: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("pretty", pretty)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::InvalidStatus(response.status()));
        }

        Ok(response.text().await?)
    }

    pub async fn authorization(&self, parameters: String) -> Result<AuthorizationResponse, EngineError> {
        self.post("/api/auth/authorization", &AuthorizationRequest { parameters })
            .await
    }

    pub async fn authorization_issue(
        &self,
        request: &AuthorizationIssueRequest,
    ) -> Result<EngineResponse, EngineError> {
        self.post("/api/auth/authorization/issue", request).await
    }

    pub async fn authorization_fail(
        &self,
        ticket: &str,
        reason: AuthorizationFailReason,
    ) -> Result<EngineResponse, EngineError> {
        let request = AuthorizationFailRequest {
            ticket: ticket.to_string(),
            reason,
        };
        self.post("/api/auth/authorization/fail", &request).await
    }

    pub async fn token(&self, request: &TokenRequest) -> Result<EngineResponse, EngineError> {
        self.post("/api/auth/token", request).await
    }

    pub async fn token_issue(&self, ticket: &str, subject: &str) -> Result<EngineResponse, EngineError> {
        let request = TokenIssueRequest {
            ticket: ticket.to_string(),
            subject: subject.to_string(),
        };
        self.post("/api/auth/token/issue", &request).await
    }

    pub async fn token_fail(
        &self,
        ticket: &str,
        reason: TokenFailReason,
    ) -> Result<EngineResponse, EngineError> {
        let request = TokenFailRequest {
            ticket: ticket.to_string(),
            reason,
        };
        self.post("/api/auth/token/fail", &request).await
    }

    /// Standard (RFC 7662) introspection
    pub async fn introspection(&self, parameters: String) -> Result<EngineResponse, EngineError> {
        self.post(
            "/api/auth/introspection/standard",
            &IntrospectionRequest { parameters },
        )
        .await
    }

    pub async fn revocation(&self, request: &RevocationRequest) -> Result<EngineResponse, EngineError> {
        self.post("/api/auth/revocation", request).await
    }

    /// OpenID Provider metadata, as a raw JSON document
    pub async fn service_configuration(&self, pretty: bool) -> Result<String, EngineError> {
        self.get_raw("/api/service/configuration", pretty).await
    }

    /// The service's JSON Web Key Set, as a raw JSON document
    pub async fn service_jwks(&self, pretty: bool) -> Result<String, EngineError> {
        self.get_raw("/api/service/jwks/get", pretty).await
    }
}
