use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::JwtError;
use auth::SessionClaims;
use chrono::Duration;
use chrono::Utc;

use crate::domain::session::errors::SessionError;
use crate::domain::session::models::Identity;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::models::SessionToken;
use crate::domain::session::ports::SessionRepository;
use crate::domain::session::ports::SessionServicePort;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Server-side session manager.
///
/// A token only resolves while its session row exists and is unexpired, so
/// deleting the row revokes the token regardless of its `exp` claim. Rows that
/// outlive their tokens are swept whenever a new session is established.
pub struct SessionService<SR, UR>
where
    SR: SessionRepository,
    UR: UserRepository,
{
    sessions: Arc<SR>,
    users: Arc<UR>,
    authenticator: Arc<Authenticator>,
    time_to_live: Duration,
}

impl<SR, UR> SessionService<SR, UR>
where
    SR: SessionRepository,
    UR: UserRepository,
{
    /// Create a new session service.
    ///
    /// # Arguments
    /// * `sessions` - Session backing store
    /// * `users` - Credential store used to re-hydrate identities
    /// * `authenticator` - Token signer
    /// * `time_to_live` - Lifetime of a session from login
    pub fn new(
        sessions: Arc<SR>,
        users: Arc<UR>,
        authenticator: Arc<Authenticator>,
        time_to_live: Duration,
    ) -> Self {
        Self {
            sessions,
            users,
            authenticator,
            time_to_live,
        }
    }

    fn decode(&self, token: &SessionToken) -> Result<(UserId, SessionId), JwtError> {
        let claims: SessionClaims = self.authenticator.validate_token(token.as_str())?;
        Ok((claims.subject()?, claims.session_id()?))
    }
}

#[async_trait]
impl<SR, UR> SessionServicePort for SessionService<SR, UR>
where
    SR: SessionRepository,
    UR: UserRepository,
{
    async fn establish(&self, user_id: UserId) -> Result<SessionToken, SessionError> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            user_id,
            created_at: now,
            expires_at: now + self.time_to_live,
        };

        let claims = SessionClaims::new(user_id, session.id, session.created_at, session.expires_at);
        let token = self
            .authenticator
            .issue_token(&claims)
            .map_err(|e| SessionError::TokenSigning(e.to_string()))?;

        let swept = self.sessions.delete_expired(now).await?;
        if swept > 0 {
            tracing::debug!(count = swept, "Expired sessions removed");
        }

        self.sessions.insert(&session).await?;
        tracing::info!(user_id = %user_id, session_id = %session.id, "Session established");

        Ok(SessionToken::new(token))
    }

    async fn current_identity(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, SessionError> {
        let (user_id, session_id) = match self.decode(token) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return Ok(None);
            }
        };

        let Some(session) = self.sessions.find(&session_id).await? else {
            tracing::debug!(session_id = %session_id, "Session token refers to no session");
            return Ok(None);
        };

        if session.user_id != user_id {
            tracing::warn!(session_id = %session_id, "Session token subject does not match session");
            return Ok(None);
        }

        if session.is_expired(Utc::now()) {
            self.sessions.delete(&session_id).await?;
            tracing::debug!(session_id = %session_id, "Expired session removed");
            return Ok(None);
        }

        let user = self.users.find_by_id(&user_id).await?;

        Ok(user.map(|user| Identity { session_id, user }))
    }

    async fn terminate(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.sessions.delete(session_id).await?;
        tracing::info!(session_id = %session_id, "Session terminated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::NewUser;
    use crate::domain::user::models::PersonName;
    use crate::domain::user::models::PostalAddress;
    use crate::domain::user::models::Role;
    use crate::domain::user::models::User;
    use crate::domain::user::models::Username;
    use crate::outbound::repositories::testing::memory_pool;
    use crate::outbound::repositories::SqliteSessionRepository;
    use crate::outbound::repositories::SqliteUserRepository;
    use crate::user::errors::UserError;

    mock! {
        pub TestSessionRepository {}

        #[async_trait]
        impl SessionRepository for TestSessionRepository {
            async fn insert(&self, session: &Session) -> Result<(), SessionError>;
            async fn find(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;
            async fn delete(&self, id: &SessionId) -> Result<(), SessionError>;
            async fn delete_expired(&self, now: chrono::DateTime<Utc>) -> Result<u64, SessionError>;
        }
    }

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: NewUser) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-signing-at-least-32-bytes";

    fn service(
        sessions: MockTestSessionRepository,
        users: MockTestUserRepository,
    ) -> SessionService<MockTestSessionRepository, MockTestUserRepository> {
        SessionService::new(
            Arc::new(sessions),
            Arc::new(users),
            Arc::new(Authenticator::new(SECRET)),
            Duration::hours(24),
        )
    }

    fn new_user() -> NewUser {
        NewUser {
            role: Role::Patient,
            first_name: PersonName::new("Jane".to_string()).unwrap(),
            last_name: PersonName::new("Doe".to_string()).unwrap(),
            username: Username::new("jane".to_string()).unwrap(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            password_hash: "$argon2id$v=19$stub".to_string(),
            profile_image: None,
            address: PostalAddress::new(
                "1 Main St".to_string(),
                "Springfield".to_string(),
                "IL".to_string(),
                "62701".to_string(),
            )
            .unwrap(),
            created_at: Utc::now(),
        }
    }

    fn user(id: i64) -> User {
        new_user().with_id(UserId(id))
    }

    fn token_for(user_id: i64, session_id: SessionId) -> SessionToken {
        let now = Utc::now();
        let claims = SessionClaims::new(user_id, session_id, now, now + Duration::hours(1));
        SessionToken::new(Authenticator::new(SECRET).issue_token(&claims).unwrap())
    }

    fn stored_session(id: SessionId, user_id: i64, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id,
            user_id: UserId(user_id),
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn test_establish_persists_session_with_ttl() {
        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_delete_expired()
            .times(1)
            .returning(|_| Ok(0));
        sessions
            .expect_insert()
            .withf(|session| {
                session.user_id == UserId(4)
                    && session.expires_at - session.created_at == Duration::hours(24)
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = service(sessions, MockTestUserRepository::new());

        let token = service.establish(UserId(4)).await.expect("session established");

        let claims: SessionClaims = Authenticator::new(SECRET)
            .validate_token(token.as_str())
            .unwrap();
        assert_eq!(claims.sub, "4");
    }

    #[tokio::test]
    async fn test_current_identity_resolves_live_session() {
        let session_id = SessionId::new();
        let mut sessions = MockTestSessionRepository::new();
        let mut users = MockTestUserRepository::new();

        sessions
            .expect_find()
            .withf(move |id| *id == session_id)
            .times(1)
            .returning(move |id| Ok(Some(stored_session(*id, 4, Duration::hours(1)))));
        users
            .expect_find_by_id()
            .withf(|id| *id == UserId(4))
            .times(1)
            .returning(|id| Ok(Some(user(id.0))));

        let service = service(sessions, users);

        let identity = service
            .current_identity(&token_for(4, session_id))
            .await
            .unwrap()
            .expect("identity resolved");

        assert_eq!(identity.session_id, session_id);
        assert_eq!(identity.user.id, UserId(4));
    }

    #[tokio::test]
    async fn test_current_identity_rejects_forged_token() {
        let mut sessions = MockTestSessionRepository::new();
        sessions.expect_find().times(0);

        let service = service(sessions, MockTestUserRepository::new());

        let now = Utc::now();
        let claims = SessionClaims::new(4, SessionId::new(), now, now + Duration::hours(1));
        let forged = Authenticator::new(b"attacker-controlled-secret-of-32-bytes!")
            .issue_token(&claims)
            .unwrap();

        let identity = service
            .current_identity(&SessionToken::new(forged))
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_current_identity_after_terminate_is_anonymous() {
        let session_id = SessionId::new();
        let mut sessions = MockTestSessionRepository::new();

        sessions
            .expect_delete()
            .withf(move |id| *id == session_id)
            .times(1)
            .returning(|_| Ok(()));
        sessions.expect_find().times(1).returning(|_| Ok(None));

        let service = service(sessions, MockTestUserRepository::new());

        service.terminate(&session_id).await.unwrap();
        let identity = service
            .current_identity(&token_for(4, session_id))
            .await
            .unwrap();

        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_current_identity_expired_session_is_removed() {
        let session_id = SessionId::new();
        let mut sessions = MockTestSessionRepository::new();
        let mut users = MockTestUserRepository::new();

        sessions
            .expect_find()
            .returning(move |id| Ok(Some(stored_session(*id, 4, Duration::seconds(-5)))));
        sessions.expect_delete().times(1).returning(|_| Ok(()));
        users.expect_find_by_id().times(0);

        let service = service(sessions, users);

        let identity = service
            .current_identity(&token_for(4, session_id))
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_current_identity_subject_mismatch() {
        let session_id = SessionId::new();
        let mut sessions = MockTestSessionRepository::new();
        let mut users = MockTestUserRepository::new();

        sessions
            .expect_find()
            .returning(move |id| Ok(Some(stored_session(*id, 9, Duration::hours(1)))));
        users.expect_find_by_id().times(0);

        let service = service(sessions, users);

        let identity = service
            .current_identity(&token_for(4, session_id))
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn test_current_identity_storage_failure_propagates() {
        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_find()
            .returning(|_| Err(SessionError::DatabaseError("disk I/O error".to_string())));

        let service = service(sessions, MockTestUserRepository::new());

        let result = service
            .current_identity(&token_for(4, SessionId::new()))
            .await;
        assert!(matches!(result, Err(SessionError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_establish_sweeps_expired_sessions_from_storage() {
        let pool = memory_pool().await;
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let sessions = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let owner = users.create(new_user()).await.unwrap();

        let now = Utc::now();
        let stale = Session {
            id: SessionId::new(),
            user_id: owner.id,
            created_at: now - Duration::hours(25),
            expires_at: now - Duration::hours(1),
        };
        sessions.insert(&stale).await.unwrap();

        let service = SessionService::new(
            Arc::clone(&sessions),
            users,
            Arc::new(Authenticator::new(SECRET)),
            Duration::hours(24),
        );
        let token = service.establish(owner.id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
        assert!(sessions.find(&stale.id).await.unwrap().is_none());
        assert!(service.current_identity(&token).await.unwrap().is_some());
    }
}
