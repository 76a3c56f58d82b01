use super::store::{decode, pending_key, session_key, SessionBackend, SessionError};
use super::{PendingAuthorization, SessionData};
use async_trait::async_trait;
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

#[derive(Clone)]
pub struct RedisSessionStore {
    conn_manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionStore {
    /// Connect to Redis and verify the connection with a PING
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self, String> {
        let client = Client::open(redis_url)
            .map_err(|err| format!("Failed to connect to Redis: {}", err))?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|err| format!("Failed to create Redis connection manager: {}", err))?;

        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(format!("Failed to ping Redis: {}", err));
        }

        Ok(Self {
            conn_manager,
            ttl_secs,
        })
    }
}

#[async_trait]
impl SessionBackend for RedisSessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionData>, SessionError> {
        let mut conn = self.conn_manager.clone();

        let value: Option<String> = conn.get(session_key(id)).await.map_err(|err| {
            error!("Redis error while loading session: {}", err);
            SessionError::Redis(err.to_string())
        })?;

        decode(value)
    }

    async fn save(&self, id: &str, data: &SessionData) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(data)?;
        let mut conn = self.conn_manager.clone();

        conn.set_ex::<_, _, ()>(session_key(id), serialized, self.ttl_secs)
            .await
            .map_err(|err| {
                error!("Redis error while saving session: {}", err);
                SessionError::Redis(err.to_string())
            })
    }

    async fn remove(&self, id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn_manager.clone();

        conn.del::<_, ()>(session_key(id)).await.map_err(|err| {
            error!("Redis error while removing session: {}", err);
            SessionError::Redis(err.to_string())
        })
    }

    async fn save_pending(&self, id: &str, pending: &PendingAuthorization) -> Result<(), SessionError> {
        let serialized = serde_json::to_string(pending)?;
        let mut conn = self.conn_manager.clone();

        conn.set_ex::<_, _, ()>(pending_key(id), serialized, self.ttl_secs)
            .await
            .map_err(|err| {
                error!("Redis error while saving pending authorization: {}", err);
                SessionError::Redis(err.to_string())
            })
    }

    async fn take_pending(&self, id: &str) -> Result<Option<PendingAuthorization>, SessionError> {
        let mut conn = self.conn_manager.clone();

        // GETDEL (Redis >= 6.2)
        let value: Option<String> = conn.get_del(pending_key(id)).await.map_err(|err| {
            error!("Redis error while taking pending authorization: {}", err);
            SessionError::Redis(err.to_string())
        })?;

        decode(value)
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }
}
