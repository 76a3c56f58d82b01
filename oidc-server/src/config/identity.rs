//! Credential verification configuration

use confique::Config;
use serde::Deserialize;

/// Where user credentials are verified
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityProviderKind {
    /// Users listed in the configuration file
    #[default]
    Local,
    /// A third-party identity provider reached over HTTP
    Remote,
}

/// A user record from the configuration file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct UserRecord {
    /// Subject identifier
    pub id: String,
    /// Login name
    pub username: String,
    /// Lowercase hex SHA-256 digest of the password
    pub password_sha256: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Identity configuration
#[derive(Debug, Config, Clone)]
pub struct IdentityConfig {
    /// Credential verifier: "local" (default) or "remote"
    #[config(env = "OIDC_IDENTITY_PROVIDER", default = "local")]
    pub provider: IdentityProviderKind,

    /// Local users, only settable from the configuration file
    #[config(default = [])]
    pub users: Vec<UserRecord>,

    /// Remote identity provider settings
    #[config(nested)]
    pub remote: RemoteIdentityConfig,
}

/// Remote identity provider configuration
#[derive(Debug, Config, Clone)]
pub struct RemoteIdentityConfig {
    /// Base URL of the identity provider API
    #[config(env = "OIDC_IDENTITY_REMOTE_URL", default = "")]
    pub url: String,

    /// Bearer token for the identity provider API (optional)
    #[config(env = "OIDC_IDENTITY_REMOTE_TOKEN", default = "")]
    pub token: String,

    /// Request timeout in seconds (default: 5)
    #[config(env = "OIDC_IDENTITY_REMOTE_TIMEOUT", default = 5)]
    pub timeout: u64,
}
