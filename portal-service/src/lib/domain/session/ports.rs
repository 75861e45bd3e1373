use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::errors::SessionError;
use crate::domain::session::models::Identity;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::models::SessionToken;
use crate::domain::user::models::UserId;

/// Port for session management.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Start a session for an authenticated identity.
    ///
    /// # Returns
    /// Signed token to hand to the client
    ///
    /// # Errors
    /// * `DatabaseError` - Session could not be persisted
    /// * `TokenSigning` - Token could not be signed
    async fn establish(&self, user_id: UserId) -> Result<SessionToken, SessionError>;

    /// Resolve the identity behind a client token.
    ///
    /// # Returns
    /// `None` when the token is forged, expired, revoked or its user is gone
    ///
    /// # Errors
    /// * `DatabaseError` / `UserLookup` - Storage failure while resolving
    async fn current_identity(&self, token: &SessionToken)
        -> Result<Option<Identity>, SessionError>;

    /// Invalidate a session immediately.
    ///
    /// # Errors
    /// * `DatabaseError` - Session could not be deleted
    async fn terminate(&self, session_id: &SessionId) -> Result<(), SessionError>;
}

/// Persistence operations for sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a new session.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, session: &Session) -> Result<(), SessionError>;

    /// Retrieve a session by identifier, expired or not.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;

    /// Delete a session; deleting an unknown session is not an error.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &SessionId) -> Result<(), SessionError>;

    /// Delete every session that expired at or before `now`.
    ///
    /// # Returns
    /// Number of sessions removed
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError>;
}
