//! Bridge to a third-party identity provider over HTTP

use super::{CredentialVerifier, IdentityError, RemoteProfile, User, UserStore};
use crate::config::RemoteIdentityConfig;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct AuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    username: String,
    #[serde(default)]
    attributes: Vec<RemoteAttribute>,
}

#[derive(Debug, Deserialize)]
struct RemoteAttribute {
    name: String,
    value: String,
}

impl From<RemoteUser> for RemoteProfile {
    fn from(user: RemoteUser) -> Self {
        let mut profile = RemoteProfile {
            username: user.username,
            ..Default::default()
        };
        for attribute in user.attributes {
            match attribute.name.as_str() {
                "email" => profile.email = Some(attribute.value),
                "given_name" => profile.given_name = Some(attribute.value),
                "family_name" => profile.family_name = Some(attribute.value),
                _ => {}
            }
        }
        profile
    }
}

/// Verifies credentials with a remote identity provider and syncs the user locally
#[derive(Clone)]
pub struct RemoteVerifier {
    client: Client,
    base_url: Url,
    token: Option<String>,
    users: Arc<UserStore>,
}

impl RemoteVerifier {
    pub fn new(config: &RemoteIdentityConfig, users: Arc<UserStore>) -> Result<Self, IdentityError> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| IdentityError::Config(format!("Invalid identity provider URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(IdentityError::Config(format!(
                "Identity provider URL cannot be a base: {}",
                config.url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: (!config.token.is_empty()).then(|| config.token.clone()),
            users,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Returns false when the provider rejected the credentials
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, IdentityError> {
        let url = self.endpoint(&["authenticate"]);
        debug!("Authenticating '{}' with identity provider", username);

        let response = self
            .request(self.client.post(url))
            .json(&AuthenticateRequest { username, password })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Identity provider rejected credentials for: {}", username);
                Ok(false)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                error!("Identity provider error {}: {}", status, error_text);
                Err(IdentityError::Api(format!("HTTP {}: {}", status, error_text)))
            }
        }
    }

    /// Fetch the user's profile from the identity provider
    async fn get_user(&self, username: &str) -> Result<RemoteUser, IdentityError> {
        let url = self.endpoint(&["users", username]);
        debug!("Fetching user from identity provider: {}", url);

        let response = self.request(self.client.get(url)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Identity provider error {}: {}", status, error_text);
            return Err(IdentityError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::Api(format!("JSON parse error: {e}")))
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for RemoteVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, IdentityError> {
        if !self.authenticate(username, password).await? {
            return Ok(None);
        }

        let remote_user = self.get_user(username).await?;
        let Some(user) = self.users.upsert_profile(remote_user.into()) else {
            warn!("No local subject available for '{}'", username);
            return Ok(None);
        };
        if !user.active {
            warn!("User '{}' is inactive", username);
            return Ok(None);
        }

        debug!("Successfully authenticated user: {}", username);
        Ok(Some(user))
    }
}
