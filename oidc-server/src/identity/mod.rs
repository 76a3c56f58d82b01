//! Users and credential verification
//!
//! The [`UserStore`] is the user profile lookup used by the consent flow and the
//! claim resolver. A [`Verifier`] checks username/password pairs, either against
//! the store itself or against a remote identity provider that syncs users into it.

use crate::config::{IdentityConfig, IdentityProviderKind, UserRecord};
use crate::errors::ApiError;
use log::{error, info};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

pub mod local;
pub mod remote;

pub use local::LocalVerifier;
pub use remote::RemoteVerifier;

/// Errors raised while talking to an identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Identity provider error: {0}")]
    Api(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        error!("Identity provider failure: {}", err);
        match err {
            IdentityError::Config(msg) => ApiError::internal(msg),
            other => ApiError::bad_gateway(format!("Identity provider failure: {other}")),
        }
    }
}

/// A user known to this server
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Subject identifier reported to the authorization engine
    pub id: String,
    pub username: String,
    /// Hex SHA-256 digest of the password; remote users have none
    pub password_sha256: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            password_sha256: Some(record.password_sha256),
            given_name: record.given_name,
            family_name: record.family_name,
            email: record.email,
            active: record.active,
        }
    }
}

/// Profile attributes reported by a remote identity provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteProfile {
    pub username: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
}

/// Prefix of the subject identifiers given to users first seen through a remote
/// identity provider
pub const REMOTE_SUBJECT_PREFIX: &str = "remote:";

/// In-process user store keyed by user id
#[derive(Debug, Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, User>>,
}

impl UserStore {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.id.clone(), User::from(record)))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Look a user up by subject identifier
    pub fn find(&self, id: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.get(id).cloned()
    }

    /// Look a user up by login name
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users.values().find(|user| user.username == username).cloned()
    }

    /// Create or refresh the user with the profile's username
    ///
    /// An existing user keeps its id and password. A new one gets the username
    /// under [`REMOTE_SUBJECT_PREFIX`] as id, so it can never take over the
    /// subject of a configured user. Returns `None` if that id is already held
    /// by a user with another username.
    pub fn upsert_profile(&self, profile: RemoteProfile) -> Option<User> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);

        let existing_id = users
            .values()
            .find(|user| user.username == profile.username)
            .map(|user| user.id.clone());

        let user = match existing_id.and_then(|id| users.remove(&id)) {
            Some(existing) => User {
                given_name: profile.given_name,
                family_name: profile.family_name,
                email: profile.email,
                ..existing
            },
            None => {
                let id = format!("{REMOTE_SUBJECT_PREFIX}{}", profile.username);
                if users.contains_key(&id) {
                    error!(
                        "Subject '{}' is already taken, not creating user '{}'",
                        id, profile.username
                    );
                    return None;
                }
                info!("Creating local user for '{}'", profile.username);
                User {
                    id,
                    username: profile.username,
                    password_sha256: None,
                    given_name: profile.given_name,
                    family_name: profile.family_name,
                    email: profile.email,
                    active: true,
                }
            }
        };

        users.insert(user.id.clone(), user.clone());
        Some(user)
    }

    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Checks a username/password pair
///
/// `Ok(None)` means the credentials were rejected. Errors are reserved for
/// failures to reach the party that decides.
#[async_trait::async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, IdentityError>;
}

/// Credential verifier selected at startup
#[derive(Clone)]
pub enum Verifier {
    Local(LocalVerifier),
    Remote(RemoteVerifier),
}

#[async_trait::async_trait]
impl CredentialVerifier for Verifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, IdentityError> {
        match self {
            Self::Local(verifier) => verifier.verify(username, password).await,
            Self::Remote(verifier) => verifier.verify(username, password).await,
        }
    }
}

/// Build the verifier described by the configuration
pub fn create_verifier(
    config: &IdentityConfig,
    users: Arc<UserStore>,
) -> Result<Verifier, IdentityError> {
    match config.provider {
        IdentityProviderKind::Local => {
            info!("Using local credential verifier with {} users", users.len());
            Ok(Verifier::Local(LocalVerifier::new(users)))
        }
        IdentityProviderKind::Remote => {
            if config.remote.url.is_empty() {
                return Err(IdentityError::Config(
                    "identity.remote.url is required for the remote identity provider"
                        .to_string(),
                ));
            }
            info!("Using remote identity provider at {}", config.remote.url);
            Ok(Verifier::Remote(RemoteVerifier::new(&config.remote, users)?))
        }
    }
}
