use async_trait::async_trait;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::ImageFilename;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::user::errors::ImageStoreError;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Register a new user from a validated command.
    ///
    /// Username uniqueness is checked before email uniqueness, and both before any
    /// image is stored or the password is hashed.
    ///
    /// # Returns
    /// Created user plus any non-fatal warnings (e.g. a rejected image type)
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `ImageStore` / `DatabaseError` / `Hashing` - Infrastructure failure
    async fn register(&self, command: RegisterUserCommand) -> Result<Registration, UserError>;

    /// Check credentials submitted at login.
    ///
    /// # Returns
    /// The authenticated user
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown username or wrong password (indistinguishable)
    /// * `DatabaseError` - Database operation failed
    async fn authenticate(&self, credentials: Credentials) -> Result<User, UserError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Insert a new user; the storage layer enforces uniqueness atomically.
    ///
    /// # Returns
    /// Created user entity with its assigned identity
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by exact username.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;

    /// Retrieve user by (lower-cased) email address.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
}

/// Storage for uploaded profile images.
#[async_trait]
pub trait ImageStore: Send + Sync + 'static {
    /// Write image bytes under a generated name; never overwrites.
    ///
    /// # Errors
    /// * `AlreadyExists` - A file with this name is already stored
    /// * `Io` - Upload area is not writable
    async fn save(&self, name: &ImageFilename, bytes: &[u8]) -> Result<(), ImageStoreError>;

    /// Remove a previously written image.
    ///
    /// # Errors
    /// * `Io` - File could not be removed
    async fn remove(&self, name: &ImageFilename) -> Result<(), ImageStoreError>;
}
