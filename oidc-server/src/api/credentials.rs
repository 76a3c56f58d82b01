//! Request parameter helpers shared by the endpoints

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use url::form_urlencoded;

/// Credentials from an `Authorization: Basic` header
#[derive(Debug, Clone, PartialEq)]
pub struct BasicCredentials {
    pub user_id: String,
    pub password: Option<String>,
}

/// Undo the form encoding RFC 6749 applies before Base64 (section 2.3.1)
fn form_decode(value: &str) -> String {
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

impl BasicCredentials {
    /// Parse a header value like `Basic dXNlcjpwYXNz`
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;

        let (user_id, password) = match decoded.split_once(':') {
            Some((user_id, password)) => (user_id, Some(form_decode(password))),
            None => (decoded.as_str(), None),
        };

        Some(Self {
            user_id: form_decode(user_id),
            password,
        })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
    }
}

/// Encode request parameters the way the engine expects them
pub fn encode_parameters(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_parse_basic_credentials() {
        // "client:s3cret"
        let credentials = BasicCredentials::parse("Basic Y2xpZW50OnMzY3JldA==").unwrap();
        assert_eq!(credentials.user_id, "client");
        assert_eq!(credentials.password.as_deref(), Some("s3cret"));

        // "client" without a password, lower-case scheme
        let credentials = BasicCredentials::parse("basic Y2xpZW50").unwrap();
        assert_eq!(credentials.user_id, "client");
        assert_eq!(credentials.password, None);
    }

    #[test]
    fn test_credentials_are_form_decoded() {
        // "my%20client:a%3Ab+c"
        let credentials = BasicCredentials::parse("Basic bXklMjBjbGllbnQ6YSUzQWIrYw==").unwrap();
        assert_eq!(credentials.user_id, "my client");
        assert_eq!(credentials.password.as_deref(), Some("a:b c"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(BasicCredentials::parse("Bearer abc").is_none());
        assert!(BasicCredentials::parse("Basic !!!").is_none());
        assert!(BasicCredentials::parse("Basic").is_none());
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(BasicCredentials::from_headers(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic bm9ib2R5Og=="));
        let credentials = BasicCredentials::from_headers(&headers).unwrap();
        assert_eq!(credentials.user_id, "nobody");
        assert_eq!(credentials.password.as_deref(), Some(""));
    }

    #[test]
    fn test_encode_parameters() {
        let pairs = vec![
            ("response_type".to_string(), "code".to_string()),
            ("scope".to_string(), "openid email".to_string()),
            ("redirect_uri".to_string(), "https://client.example.com/cb?x=1".to_string()),
        ];
        assert_eq!(
            encode_parameters(&pairs),
            "response_type=code&scope=openid+email&redirect_uri=https%3A%2F%2Fclient.example.com%2Fcb%3Fx%3D1"
        );
    }
}
