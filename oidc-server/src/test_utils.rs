use crate::config::Settings;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde_json::Value;
use tower::ServiceExt;
use url::form_urlencoded;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Test fixture for driving the router against mocked external services.
///
/// Holds mock servers for the authorization engine and the remote identity
/// provider, and keeps the session cookie between requests like a browser.
///
/// ```rust
/// let mut fixture = TestFixture::new().await;
/// fixture
///     .mock_engine_post("/api/auth/authorization", json!({"action": "INTERACTION", "ticket": "t"}), 1)
///     .await;
/// let response = fixture.get("/api/authorization?response_type=code").await;
/// response.assert_ok();
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration settings
    pub settings: Settings,
    /// Mock server for the authorization engine
    pub engine_mock: MockServer,
    /// Mock server for the remote identity provider
    pub identity_mock: MockServer,
    /// Session cookie (`name=value`) sent with every request, if any
    pub cookie: Option<String>,
}

impl TestFixture {
    /// Creates a fixture with default test settings
    pub async fn new() -> Self {
        Self::with_settings(|_| {}).await
    }

    /// Creates a fixture after letting the caller adjust the test settings
    pub async fn with_settings(customize: impl FnOnce(&mut Settings)) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let engine_mock = MockServer::start().await;
        let identity_mock = MockServer::start().await;

        let mut settings = Settings::for_test_with_mocks(&engine_mock, &identity_mock);
        customize(&mut settings);

        let state = AppState::new(settings.clone())
            .await
            .expect("Failed to create test state");
        let app = create_app(state);

        Self {
            app,
            settings,
            engine_mock,
            identity_mock,
            cookie: None,
        }
    }

    /// Initializes the test logger; later calls are no-ops
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder carrying the current session cookie
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder
    }

    /// Sends a GET request to the specified URI
    pub async fn get(&mut self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a form-encoded POST request
    pub async fn post_form(&mut self, uri: impl AsRef<str>, form: &[(&str, &str)]) -> TestResponse {
        self.post_form_with_headers(uri, form, &[]).await
    }

    /// Sends a form-encoded POST request with extra headers
    pub async fn post_form_with_headers(
        &mut self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let request = self.form_request(uri, form, headers);
        self.send(request).await
    }

    /// Builds a form-encoded POST request carrying the current session cookie
    pub fn form_request(
        &self,
        uri: impl AsRef<str>,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Request<Body> {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();

        let mut builder = self
            .request_builder(Method::POST, uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        builder.body(Body::from(body)).expect("Failed to build request")
    }

    /// Sends a request through the router and records any new session cookie
    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.dispatch(request).await;
        if let Some(cookie) = response.session_cookie(&self.settings.session.cookie_name) {
            self.cookie = Some(cookie);
        }
        response
    }

    /// Sends a request through the router without touching the stored cookie,
    /// so several requests can be in flight at once
    pub async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        let text = String::from_utf8_lossy(&body).into_owned();
        let json = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            text,
            json,
        }
    }

    /// Mounts a JSON response for a POST to the engine
    pub async fn mock_engine_post(&self, path: &str, response: Value, expected_calls: u64) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(path))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(expected_calls)
            .mount(&self.engine_mock)
            .await;
    }

    /// Mounts a JSON response for a POST to the engine with a matching request body
    pub async fn mock_engine_post_with_body(
        &self,
        path: &str,
        body: Value,
        response: Value,
        expected_calls: u64,
    ) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(path))
            .and(matchers::body_json(body))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .expect(expected_calls)
            .mount(&self.engine_mock)
            .await;
    }

    /// JSON bodies the engine received on `path`, in order
    pub async fn engine_requests(&self, path: &str) -> Vec<Value> {
        self.engine_mock
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == path)
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }
}

/// Response from a test request
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw response body
    pub text: String,
    /// Response body as JSON, `Value::Null` when the body is not JSON
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {} with body: {}",
            expected, self.status, self.text
        );
        self
    }

    /// Shorthand for `assert_status(StatusCode::OK)`
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Value of a response header, if present and valid UTF-8
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `name=value` part of the Set-Cookie header for `cookie_name`
    pub fn session_cookie(&self, cookie_name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{cookie_name}=")))
            .map(str::to_string)
    }
}
