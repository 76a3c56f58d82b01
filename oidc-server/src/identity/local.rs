use super::{CredentialVerifier, IdentityError, User, UserStore};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 digest of a password
pub fn password_digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Compares in constant time; the stored digest may be upper or lower case hex
fn digest_matches(stored: &str, password: &str) -> bool {
    let stored = stored.to_ascii_lowercase();
    stored.as_bytes().ct_eq(password_digest(password).as_bytes()).into()
}

/// Verifies credentials against the configured users
#[derive(Clone)]
pub struct LocalVerifier {
    users: Arc<UserStore>,
}

impl LocalVerifier {
    pub fn new(users: Arc<UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl CredentialVerifier for LocalVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Option<User>, IdentityError> {
        let Some(user) = self.users.find_by_username(username) else {
            debug!("Unknown user: {}", username);
            return Ok(None);
        };

        let matches = user
            .password_sha256
            .as_deref()
            .is_some_and(|stored| digest_matches(stored, password));

        if !matches {
            warn!("Invalid password for user: {}", username);
            return Ok(None);
        }

        if !user.active {
            warn!("User '{}' is inactive", username);
            return Ok(None);
        }

        debug!("Successfully authenticated user: {}", username);
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::tests::test_user_store;

    #[test]
    fn test_password_digest() {
        assert_eq!(
            password_digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn test_digest_matches() {
        let digest = password_digest("password");
        assert!(digest_matches(&digest, "password"));
        assert!(digest_matches(&digest.to_ascii_uppercase(), "password"));
        assert!(!digest_matches(&digest, "Password"));
        assert!(!digest_matches(&digest[..10], "password"));
        assert!(!digest_matches("", "password"));
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let verifier = LocalVerifier::new(test_user_store());
        let user = verifier.verify("ada", "ada-password").await.unwrap();
        assert_eq!(user.map(|u| u.id), Some("1001".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let verifier = LocalVerifier::new(test_user_store());
        assert!(verifier.verify("ada", "wrong").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let verifier = LocalVerifier::new(test_user_store());
        assert!(verifier.verify("nobody", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_user() {
        let verifier = LocalVerifier::new(test_user_store());
        assert!(verifier
            .verify("retired", "retired-password")
            .await
            .unwrap()
            .is_none());
    }
}
