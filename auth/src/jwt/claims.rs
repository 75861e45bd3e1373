use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Claims carried by a session token.
///
/// `sub` names the authenticated identity and `jti` the server-side session the
/// token was issued for. A token is only as good as the session row behind it:
/// revoking the session invalidates the token even before `exp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (identity of the authenticated user)
    pub sub: String,

    /// JWT ID (server-side session identifier)
    pub jti: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    /// Create claims for a freshly established session.
    ///
    /// # Arguments
    /// * `subject` - Identity the session is bound to
    /// * `session_id` - Server-side session identifier
    /// * `issued_at` - Session creation time
    /// * `expires_at` - Session expiry time
    pub fn new(
        subject: impl ToString,
        session_id: impl ToString,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            jti: session_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Parse the subject into the caller's identity type.
    ///
    /// # Errors
    /// * `MissingClaim` - Subject is empty or does not parse
    pub fn subject<T: std::str::FromStr>(&self) -> Result<T, JwtError> {
        self.sub.parse().map_err(|_| JwtError::MissingClaim("sub"))
    }

    /// Parse the token ID into the caller's session identifier type.
    ///
    /// # Errors
    /// * `MissingClaim` - Token ID is empty or does not parse
    pub fn session_id<T: std::str::FromStr>(&self) -> Result<T, JwtError> {
        self.jti.parse().map_err(|_| JwtError::MissingClaim("jti"))
    }
}
