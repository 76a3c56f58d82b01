use super::{PendingAuthorization, SessionData};
use crate::config::{SessionConfig, SessionStoreKind};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use super::memory::InMemorySessionStore;
pub use super::redis::RedisSessionStore;

/// Errors that can occur during session store operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse session: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Store key for a session id
pub(super) fn session_key(id: &str) -> String {
    format!("session:{id}")
}

/// Store key for the authorization waiting on session `id`
pub(super) fn pending_key(id: &str) -> String {
    format!("pending:{id}")
}

/// Parse a stored JSON value
pub(super) fn decode<T: DeserializeOwned>(value: Option<String>) -> Result<Option<T>, SessionError> {
    value
        .map(|value| serde_json::from_str(&value))
        .transpose()
        .map_err(|e| SessionError::Deserialization(e.to_string()))
}

/// Interface shared by all session store implementations.
///
/// Entries expire after the configured session TTL; every save refreshes it.
#[async_trait::async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load the session data stored under `id`
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError>;

    /// Store session data under `id`, replacing what was there
    async fn save(&self, id: &str, data: &SessionData) -> Result<(), SessionError>;

    /// Remove the session stored under `id`
    async fn remove(&self, id: &str) -> Result<(), SessionError>;

    /// Store the authorization waiting for a decision on session `id`
    async fn save_pending(&self, id: &str, pending: &PendingAuthorization) -> Result<(), SessionError>;

    /// Remove and return the pending authorization of session `id`.
    ///
    /// Removal and read are one store operation: of two concurrent callers
    /// only one gets the value.
    async fn take_pending(&self, id: &str) -> Result<Option<PendingAuthorization>, SessionError>;

    /// Returns Ok(()) if the backend can serve requests
    async fn health_check(&self) -> Result<(), String>;
}

/// Session store selected at startup from configuration
#[derive(Clone)]
pub enum SessionStore {
    /// Sessions kept in process memory (Moka)
    InMemory(InMemorySessionStore),
    /// Sessions kept in Redis, shared between server instances
    Redis(RedisSessionStore),
}

#[async_trait::async_trait]
impl SessionBackend for SessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        match self {
            Self::InMemory(store) => store.load(id).await,
            Self::Redis(store) => store.load(id).await,
        }
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), SessionError> {
        match self {
            Self::InMemory(store) => store.save(id, data).await,
            Self::Redis(store) => store.save(id, data).await,
        }
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        match self {
            Self::InMemory(store) => store.remove(id).await,
            Self::Redis(store) => store.remove(id).await,
        }
    }

    async fn save_pending(&self, id: &str, pending: &PendingAuthorization) -> Result<(), SessionError> {
        match self {
            Self::InMemory(store) => store.save_pending(id, pending).await,
            Self::Redis(store) => store.save_pending(id, pending).await,
        }
    }

    async fn take_pending(&self, id: &str) -> Result<Option<PendingAuthorization>, SessionError> {
        match self {
            Self::InMemory(store) => store.take_pending(id).await,
            Self::Redis(store) => store.take_pending(id).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(store) => store.health_check().await,
            Self::Redis(store) => store.health_check().await,
        }
    }
}

/// Create the session store described by the configuration
pub async fn create_session_store(config: &SessionConfig) -> Result<SessionStore, SessionError> {
    match config.store {
        SessionStoreKind::InMemory => {
            let store = InMemorySessionStore::new(config.ttl, config.memory_capacity)
                .map_err(SessionError::Config)?;
            Ok(SessionStore::InMemory(store))
        }
        SessionStoreKind::Redis => {
            if config.redis_url.is_empty() {
                return Err(SessionError::Config(
                    "Redis URL is required for the Redis session store".to_string(),
                ));
            }
            let store = RedisSessionStore::new(&config.redis_url, config.ttl)
                .await
                .map_err(SessionError::Config)?;
            Ok(SessionStore::Redis(store))
        }
    }
}
