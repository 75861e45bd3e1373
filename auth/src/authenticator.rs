use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token signing.
///
/// Services hold one `Authenticator` built from the configured secret and use it
/// both to check credentials and to sign the tokens they hand to clients.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `secret` - Secret key for token signing
    pub fn new(secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(secret),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is unusable
    pub fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<(), AuthenticationError> {
        if self.password_hasher.verify(password, stored_hash)? {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    /// Spend one hashing round on a password whose account does not exist.
    ///
    /// Keeps the "unknown user" path as slow as the "wrong password" path so
    /// response timing does not reveal which usernames are registered.
    pub fn reject_unknown_account(&self, password: &str) -> AuthenticationError {
        if let Err(e) = self.password_hasher.hash(password) {
            return AuthenticationError::PasswordError(e);
        }
        AuthenticationError::InvalidCredentials
    }

    /// Sign a payload into a token.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        self.jwt_handler.encode(claims)
    }

    /// Validate and decode a token.
    ///
    /// # Errors
    /// * `JwtError` - Token validation or decoding failed
    pub fn validate_token<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        self.jwt_handler.decode(token)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::jwt::SessionClaims;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_verify_password_success() {
        let authenticator = Authenticator::new(SECRET);

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        assert!(authenticator.verify_password("my_password", &hash).is_ok());
    }

    #[test]
    fn test_verify_password_mismatch() {
        let authenticator = Authenticator::new(SECRET);

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.verify_password("wrong_password", &hash);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reject_unknown_account_is_invalid_credentials() {
        let authenticator = Authenticator::new(SECRET);

        let error = authenticator.reject_unknown_account("anything");
        assert!(matches!(error, AuthenticationError::InvalidCredentials));
    }

    #[test]
    fn test_issue_and_validate_session_token() {
        let authenticator = Authenticator::new(SECRET);
        let now = Utc::now();
        let claims = SessionClaims::new(12, "session-1", now, now + Duration::hours(1));

        let token = authenticator
            .issue_token(&claims)
            .expect("Failed to issue token");

        let decoded: SessionClaims = authenticator
            .validate_token(&token)
            .expect("Failed to validate token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_validate_tampered_token() {
        let authenticator = Authenticator::new(SECRET);
        let now = Utc::now();
        let claims = SessionClaims::new(12, "session-1", now, now + Duration::hours(1));
        let token = authenticator.issue_token(&claims).unwrap();

        let forged = Authenticator::new(b"another_secret_key_at_least_32_bytes")
            .validate_token::<SessionClaims>(&token);
        assert!(forged.is_err());
    }
}
