//! Connection settings for the hosted authorization engine

use confique::Config;

/// Authorization engine (Authlete API) configuration
#[derive(Debug, Config, Clone)]
pub struct AuthleteConfig {
    /// Base URL of the engine API (default: https://api.authlete.com)
    #[config(env = "OIDC_AUTHLETE_BASE_URL", default = "https://api.authlete.com")]
    pub base_url: String,

    /// Service API key, sent as the Basic auth user
    #[config(env = "OIDC_AUTHLETE_API_KEY", default = "")]
    pub api_key: String,

    /// Service API secret, sent as the Basic auth password
    #[config(env = "OIDC_AUTHLETE_API_SECRET", default = "")]
    pub api_secret: String,

    /// Timeout for engine calls in seconds (default: 5)
    #[config(env = "OIDC_AUTHLETE_TIMEOUT", default = 5)]
    pub timeout: u64,
}

impl AuthleteConfig {
    /// Build an absolute engine URL for the given API path
    pub fn get_url(&self, path: impl AsRef<str>) -> String {
        let path = path.as_ref();
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
