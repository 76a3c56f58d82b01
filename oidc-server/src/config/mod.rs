pub(crate) use crate::config::authlete::AuthleteConfig;
pub(crate) use crate::config::identity::{
    IdentityConfig, IdentityProviderKind, RemoteIdentityConfig, UserRecord,
};
pub(crate) use crate::config::session::{SessionConfig, SessionStoreKind};
use confique::Config;
use std::path::PathBuf;

pub mod authlete;
pub mod identity;
pub mod session;

/// Environment variable that overrides the configuration file location
pub const CONFIG_FILE_ENV: &str = "OIDC_CONFIG_FILE";

/// Configuration file read when `OIDC_CONFIG_FILE` is not set
pub const DEFAULT_CONFIG_FILE: &str = "oidc-server.toml";

/// Main configuration structure for the OIDC server
#[derive(Debug, Config, Clone)]
pub struct Settings {
    /// The port the server will listen to (default: 8000)
    #[config(env = "OIDC_PORT", default = 8000)]
    pub port: u16,

    /// Authorization engine configuration
    #[config(nested)]
    pub authlete: AuthleteConfig,

    /// Browser session configuration
    #[config(nested)]
    pub session: SessionConfig,

    /// User store and credential verifier configuration
    #[config(nested)]
    pub identity: IdentityConfig,
}

impl Settings {
    /// Load configuration from the environment and the configuration file
    ///
    /// Environment variables take precedence over the file, the file over defaults.
    /// A missing file is not an error.
    pub fn new() -> Result<Self, confique::Error> {
        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::load_from(path)
    }

    /// Load configuration using the given file as the file source
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, confique::Error> {
        Self::builder().env().file(path.into()).load()
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(
        engine_mock: &wiremock::MockServer,
        identity_mock: &wiremock::MockServer,
    ) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            authlete: AuthleteConfig {
                base_url: engine_mock.uri(),
                api_key: "test_api_key".to_string(),
                api_secret: "test_api_secret".to_string(),
                timeout: 5,
            },
            session: SessionConfig {
                cookie_name: "oidc_session".to_string(),
                secure_cookie: false,
                ttl: 60,
                store: SessionStoreKind::InMemory,
                memory_capacity: 8,
                redis_url: String::new(),
            },
            identity: IdentityConfig {
                provider: IdentityProviderKind::Local,
                users: crate::identity::tests::test_user_records(),
                remote: RemoteIdentityConfig {
                    url: identity_mock.uri(),
                    token: String::new(),
                    timeout: 5,
                },
            },
        }
    }
}
