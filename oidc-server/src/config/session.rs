use confique::Config;
use serde::Deserialize;

/// Specifies which store keeps browser sessions
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStoreKind {
    #[default]
    InMemory,
    Redis,
}

/// Configuration for browser sessions
#[derive(Debug, Config, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie (default: oidc_session)
    #[config(env = "OIDC_SESSION_COOKIE_NAME", default = "oidc_session")]
    pub cookie_name: String,

    /// Add the `Secure` attribute to the session cookie (default: false)
    #[config(env = "OIDC_SESSION_SECURE_COOKIE", default = false)]
    pub secure_cookie: bool,

    /// Session lifetime in seconds (default: 1 hour)
    #[config(env = "OIDC_SESSION_TTL", default = 3600)]
    pub ttl: u64,

    /// Session store: "in-memory" (default) or "redis"
    #[config(env = "OIDC_SESSION_STORE", default = "in-memory")]
    pub store: SessionStoreKind,

    /// Maximum in-memory store size in MiB (default: 64 MiB)
    #[config(env = "OIDC_SESSION_MEMORY_CAPACITY", default = 64)]
    pub memory_capacity: usize,

    /// Redis connection string, required when the store is "redis"
    #[config(env = "OIDC_SESSION_REDIS_URL", default = "")]
    pub redis_url: String,
}
