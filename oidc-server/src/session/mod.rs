//! Browser sessions
//!
//! A session is identified by a random id carried in a cookie. It records who is
//! logged in and the authorization ticket waiting for the user's decision.

use crate::config::SessionConfig;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use http::header::{COOKIE, SET_COOKIE};
use http::request::Parts;
use http::HeaderValue;
use log::{debug, error};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod memory;
mod redis;
pub mod store;

pub use store::{create_session_store, SessionBackend, SessionError, SessionStore};

const SESSION_ID_BYTES: usize = 32;

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        error!("Session store failure: {}", err);
        ApiError::internal(format!("Session store failure: {err}"))
    }
}

/// The authorization request waiting for the user's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub ticket: String,
    #[serde(default)]
    pub claim_names: Vec<String>,
    #[serde(default)]
    pub claim_locales: Vec<String>,
}

/// What is persisted for one browser session.
///
/// The pending authorization is stored under its own key so that it can be
/// taken atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<String>,
    /// Unix timestamp (seconds) of the last login
    pub authenticated_at: Option<i64>,
}

/// Change to the pending authorization, applied on save
#[derive(Debug, Default)]
enum PendingChange {
    #[default]
    Keep,
    Store(PendingAuthorization),
    Clear,
}

/// Login state of the browser for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthenticationState {
    pub user_id: Option<String>,
    pub authenticated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CookieSettings {
    name: String,
    secure: bool,
    max_age: u64,
}

impl From<&SessionConfig> for CookieSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
            max_age: config.ttl,
        }
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_valid_session_id(id: &str) -> bool {
    URL_SAFE_NO_PAD
        .decode(id)
        .is_ok_and(|bytes| bytes.len() == SESSION_ID_BYTES)
}

/// Find a cookie value in the request headers
fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Handle to the current browser session
///
/// Changes are kept in memory until [`Session::finish`] writes them back and
/// sets the cookie on the response.
pub struct Session {
    id: String,
    data: SessionData,
    store: Arc<SessionStore>,
    cookie: CookieSettings,
    pending: PendingChange,
    /// Id to delete from the store after a rotation
    previous_id: Option<String>,
    is_new: bool,
    dirty: bool,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let config = &state.settings.session;
        let store = state.sessions.clone();
        let cookie = CookieSettings::from(config);

        if let Some(id) = cookie_value(parts, &config.cookie_name).filter(|id| is_valid_session_id(id)) {
            if let Some(data) = store.load(id).await? {
                return Ok(Self {
                    id: id.to_string(),
                    data,
                    store,
                    cookie,
                    pending: PendingChange::Keep,
                    previous_id: None,
                    is_new: false,
                    dirty: false,
                });
            }
            debug!("Session cookie refers to an unknown or expired session");
        }

        Ok(Self::new(store, cookie))
    }
}

impl Session {
    fn new(store: Arc<SessionStore>, cookie: CookieSettings) -> Self {
        Self {
            id: generate_session_id(),
            data: SessionData::default(),
            store,
            cookie,
            pending: PendingChange::Keep,
            previous_id: None,
            is_new: true,
            dirty: false,
        }
    }

    /// Login state as seen by the consent decision rules
    pub fn auth_state(&self) -> AuthenticationState {
        AuthenticationState {
            user_id: self.data.user_id.clone(),
            authenticated_at: self
                .data
                .authenticated_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.user_id.as_deref()
    }

    /// Record a successful login under a fresh session id
    pub fn login(&mut self, user_id: impl Into<String>, now: DateTime<Utc>) {
        self.rotate();
        self.data.user_id = Some(user_id.into());
        self.data.authenticated_at = Some(now.timestamp());
        self.dirty = true;
    }

    /// Forget the logged-in user and anything pending, under a fresh session id
    pub fn logout(&mut self) {
        self.rotate();
        self.data = SessionData::default();
        self.pending = PendingChange::Clear;
        self.dirty = true;
    }

    /// Remember the ticket the consent page was rendered for
    pub fn store_authorization(
        &mut self,
        ticket: impl Into<String>,
        claim_names: Vec<String>,
        claim_locales: Vec<String>,
    ) {
        self.pending = PendingChange::Store(PendingAuthorization {
            ticket: ticket.into(),
            claim_names,
            claim_locales,
        });
        self.dirty = true;
    }

    /// Remove and return the pending authorization so it can be used only once.
    ///
    /// The stored entry is removed right away, not on save: a second request
    /// on the same session finds nothing even while this one is still running.
    pub async fn take_authorization(&mut self) -> Result<Option<PendingAuthorization>, SessionError> {
        match std::mem::replace(&mut self.pending, PendingChange::Clear) {
            PendingChange::Store(pending) => Ok(Some(pending)),
            PendingChange::Clear => Ok(None),
            PendingChange::Keep => {
                self.pending = PendingChange::Keep;
                match self.stored_id() {
                    Some(id) => self.store.take_pending(id).await,
                    None => Ok(None),
                }
            }
        }
    }

    pub fn clear_authorization(&mut self) {
        self.pending = PendingChange::Clear;
    }

    /// Id the store knows this session by, if any
    fn stored_id(&self) -> Option<&str> {
        if self.is_new {
            return None;
        }
        Some(self.previous_id.as_deref().unwrap_or(&self.id))
    }

    fn rotate(&mut self) {
        if !self.is_new && self.previous_id.is_none() {
            self.previous_id = Some(self.id.clone());
        }
        self.id = generate_session_id();
    }

    /// The cookie is re-sent with every save so its Max-Age follows the store TTL
    fn needs_cookie(&self) -> bool {
        self.dirty
    }

    fn set_cookie_header(&self) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.cookie.name, self.id, self.cookie.max_age
        );
        if self.cookie.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    /// Persist pending changes
    pub async fn save(&mut self) -> Result<(), SessionError> {
        // A rotation carries the pending authorization over to the new id
        let mut carried = None;
        if let Some(previous) = self.previous_id.as_deref() {
            self.store.remove(previous).await?;
            carried = self.store.take_pending(previous).await?;
        }
        if self.dirty {
            self.store.save(&self.id, &self.data).await?;
        }

        match std::mem::take(&mut self.pending) {
            PendingChange::Store(pending) => self.store.save_pending(&self.id, &pending).await?,
            PendingChange::Clear => {
                if !self.is_new && self.previous_id.is_none() {
                    self.store.take_pending(&self.id).await?;
                }
            }
            PendingChange::Keep => {
                if let Some(pending) = carried {
                    self.store.save_pending(&self.id, &pending).await?;
                }
            }
        }
        Ok(())
    }

    /// Persist the session and attach the cookie to the response
    pub async fn finish(mut self, response: impl IntoResponse) -> Response {
        if let Err(err) = self.save().await {
            return ApiError::from(err).into_response();
        }

        let mut response = response.into_response();
        if self.needs_cookie() {
            if let Some(value) = self.set_cookie_header() {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::InMemorySessionStore;
    use axum::body::Body;
    use chrono::TimeZone;
    use http::{Request, StatusCode};

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::InMemory(
            InMemorySessionStore::new(60, 1).unwrap(),
        ))
    }

    fn cookie_settings(secure: bool) -> CookieSettings {
        CookieSettings {
            name: "oidc_session".to_string(),
            secure,
            max_age: 60,
        }
    }

    fn set_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    fn cookie_id(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.split_once('='))
            .map(|(_, id)| id.to_string())
            .unwrap()
    }

    #[test]
    fn test_generated_ids_are_valid_and_distinct() {
        let first = generate_session_id();
        let second = generate_session_id();
        assert!(is_valid_session_id(&first));
        assert_eq!(first.len(), 43);
        assert_ne!(first, second);
        assert!(!is_valid_session_id("short"));
        assert!(!is_valid_session_id("not base64 at all!"));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let (parts, _) = Request::builder()
            .header(COOKIE, "theme=dark; oidc_session=abc ;other=1")
            .header(COOKIE, "late=2")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(cookie_value(&parts, "oidc_session"), Some("abc"));
        assert_eq!(cookie_value(&parts, "late"), Some("2"));
        assert_eq!(cookie_value(&parts, "missing"), None);
    }

    #[tokio::test]
    async fn test_untouched_new_session_sets_no_cookie() {
        let session = Session::new(store(), cookie_settings(false));
        let response = session.finish(StatusCode::OK).await;
        assert!(set_cookie(&response).is_none());
    }

    /// A session as loaded from the store for a request carrying its cookie
    async fn loaded(store: &Arc<SessionStore>, id: &str) -> Session {
        Session {
            id: id.to_string(),
            data: store.load(id).await.unwrap().unwrap_or_default(),
            store: store.clone(),
            cookie: cookie_settings(false),
            pending: PendingChange::Keep,
            previous_id: None,
            is_new: false,
            dirty: false,
        }
    }

    #[tokio::test]
    async fn test_pending_authorization_is_taken_once() {
        let store = store();
        let mut session = Session::new(store.clone(), cookie_settings(true));
        session.store_authorization("ticket-1", vec!["email".to_string()], vec!["ja".to_string()]);

        let response = session.finish(Body::empty()).await;
        let header = set_cookie(&response).expect("cookie should be set");
        assert!(header.starts_with("oidc_session="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.ends_with("; Secure"));

        let id = cookie_id(&header);
        let mut session = loaded(&store, &id).await;
        let pending = session.take_authorization().await.unwrap().unwrap();
        assert_eq!(pending.ticket, "ticket-1");
        assert_eq!(pending.claim_locales, vec!["ja".to_string()]);
        assert!(session.take_authorization().await.unwrap().is_none());

        let response = session.finish(StatusCode::OK).await;
        assert!(set_cookie(&response).is_none());
        assert!(store.take_pending(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_is_visible_before_save() {
        let store = store();
        store
            .save_pending(
                "sid",
                &PendingAuthorization {
                    ticket: "ticket-1".to_string(),
                    claim_names: vec![],
                    claim_locales: vec![],
                },
            )
            .await
            .unwrap();

        let mut first = loaded(&store, "sid").await;
        let mut second = loaded(&store, "sid").await;

        assert!(first.take_authorization().await.unwrap().is_some());
        assert!(second.take_authorization().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_carries_pending_authorization() {
        let store = store();
        store.save("sid", &SessionData::default()).await.unwrap();
        let mut session = loaded(&store, "sid").await;
        session.store_authorization("ticket-1", vec![], vec![]);
        session.finish(StatusCode::OK).await;

        let mut session = loaded(&store, "sid").await;
        session.login("1001", Utc::now());
        let response = session.finish(StatusCode::OK).await;
        let id = cookie_id(&set_cookie(&response).expect("rotated cookie"));

        assert!(store.take_pending("sid").await.unwrap().is_none());
        assert_eq!(
            store.take_pending(&id).await.unwrap().map(|p| p.ticket),
            Some("ticket-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_every_save_refreshes_the_cookie() {
        let store = store();
        store.save("sid", &SessionData::default()).await.unwrap();

        let mut session = loaded(&store, "sid").await;
        session.store_authorization("ticket-1", vec![], vec![]);
        let response = session.finish(StatusCode::OK).await;

        let header = set_cookie(&response).expect("cookie should be re-sent");
        assert_eq!(cookie_id(&header), "sid");
        assert!(header.contains("Max-Age=60"));
    }

    #[tokio::test]
    async fn test_login_rotates_session_id() {
        let store = store();
        store
            .save("existing", &SessionData::default())
            .await
            .unwrap();

        let mut session = loaded(&store, "existing").await;
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        session.login("1001", now);

        let state = session.auth_state();
        assert_eq!(state.user_id.as_deref(), Some("1001"));
        assert_eq!(state.authenticated_at, Some(now));

        let response = session.finish(StatusCode::OK).await;
        let id = cookie_id(&set_cookie(&response).expect("rotated cookie"));
        assert_ne!(id, "existing");
        assert!(store.load("existing").await.unwrap().is_none());
        assert_eq!(
            store.load(&id).await.unwrap().unwrap().user_id.as_deref(),
            Some("1001")
        );
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = store();
        store.save("sid", &SessionData::default()).await.unwrap();
        let mut session = loaded(&store, "sid").await;
        session.login("1001", Utc::now());
        session.store_authorization("ticket-1", vec![], vec![]);
        let response = session.finish(StatusCode::OK).await;

        let id = cookie_id(&set_cookie(&response).expect("rotated cookie"));
        let mut session = loaded(&store, &id).await;
        session.logout();
        assert_eq!(session.auth_state(), AuthenticationState::default());
        assert!(session.take_authorization().await.unwrap().is_none());
        session.finish(StatusCode::OK).await;

        assert!(store.take_pending(&id).await.unwrap().is_none());
    }
}
