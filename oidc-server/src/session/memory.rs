use super::store::{decode, pending_key, session_key, SessionBackend, SessionError};
use super::{PendingAuthorization, SessionData};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::time::Duration;

#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: MokaCache<String, String>,
}

impl InMemorySessionStore {
    /// Initialize a new in-memory session store
    pub fn new(ttl_secs: u64, capacity_mib: usize) -> Result<Self, String> {
        let max_capacity_bytes: u64 = capacity_mib
            .checked_mul(1024 * 1024)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| format!("Session store capacity overflow: {capacity_mib} MiB"))?;

        // Moka expires entries from their last write, so each save extends the session
        let sessions = MokaCache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .weigher(|key: &String, value: &String| -> u32 {
                (key.len() + value.len()).try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self { sessions })
    }
}

#[async_trait]
impl SessionBackend for InMemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        decode(self.sessions.get(&session_key(id)).await)
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(data)?;
        self.sessions.insert(session_key(id), serialized).await;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.remove(&session_key(id)).await;
        Ok(())
    }

    async fn save_pending(&self, id: &str, pending: &PendingAuthorization) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(pending)?;
        self.sessions.insert(pending_key(id), serialized).await;
        Ok(())
    }

    async fn take_pending(&self, id: &str) -> Result<Option<PendingAuthorization>, SessionError> {
        decode(self.sessions.remove(&pending_key(id)).await)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
