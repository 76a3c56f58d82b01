use crate::{
    authlete::AuthleteClient,
    config::Settings,
    identity::{create_verifier, UserStore, Verifier},
    session::{create_session_store, SessionBackend, SessionStore},
};
use std::io;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionStore>,
    pub engine: Arc<AuthleteClient>,
    pub users: Arc<UserStore>,
    pub verifier: Arc<Verifier>,
}

impl AppState {
    pub async fn new(settings: Settings) -> Result<Self, io::Error> {
        let sessions = create_session_store(&settings.session)
            .await
            .map_err(|e| io::Error::other(format!("Failed to create session store: {}", e)))?;

        let engine = AuthleteClient::new(settings.authlete.clone()).map_err(|e| {
            io::Error::other(format!("Failed to create authorization engine client: {}", e))
        })?;

        let users = Arc::new(UserStore::new(settings.identity.users.clone()));
        let verifier = create_verifier(&settings.identity, users.clone()).map_err(|e| {
            io::Error::other(format!("Failed to create credential verifier: {}", e))
        })?;

        Ok(Self {
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
            engine: Arc::new(engine),
            users,
            verifier: Arc::new(verifier),
        })
    }

    /// Check if the components needed to serve requests are healthy
    pub async fn health_check(&self) -> Result<(), String> {
        self.sessions.health_check().await
    }
}
