use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::user::models::Credentials;
use crate::domain::user::models::ImageFilename;
use crate::domain::user::models::ImagePolicy;
use crate::domain::user::models::ImageUpload;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::Registration;
use crate::domain::user::models::RegistrationWarning;
use crate::domain::user::models::User;
use crate::domain::user::models::Username;
use crate::user::errors::UserError;
use crate::user::ports::ImageStore;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for registration and authentication.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR, IS>
where
    UR: UserRepository,
    IS: ImageStore,
{
    repository: Arc<UR>,
    image_store: Arc<IS>,
    authenticator: Arc<Authenticator>,
    image_policy: ImagePolicy,
}

impl<UR, IS> UserService<UR, IS>
where
    UR: UserRepository,
    IS: ImageStore,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Credential store
    /// * `image_store` - Upload area for profile images
    /// * `authenticator` - Password hashing and verification
    /// * `image_policy` - Accepted profile image types
    pub fn new(
        repository: Arc<UR>,
        image_store: Arc<IS>,
        authenticator: Arc<Authenticator>,
        image_policy: ImagePolicy,
    ) -> Self {
        Self {
            repository,
            image_store,
            authenticator,
            image_policy,
        }
    }

    async fn store_profile_image(
        &self,
        upload: ImageUpload,
        warnings: &mut Vec<RegistrationWarning>,
    ) -> Result<Option<ImageFilename>, UserError> {
        let Some(extension) = self.image_policy.accepted_extension(&upload.filename) else {
            tracing::info!(
                filename = %upload.filename,
                "Profile image rejected: unsupported type"
            );
            warnings.push(RegistrationWarning::UnsupportedImageType {
                allowed: self.image_policy.allowed_extensions().to_vec(),
            });
            return Ok(None);
        };

        let name = ImageFilename::generate(&upload.filename, &extension, Utc::now());
        self.image_store.save(&name, &upload.bytes).await?;
        tracing::debug!(image = %name.as_str(), bytes = upload.bytes.len(), "Profile image stored");

        Ok(Some(name))
    }
}

fn credential_error(err: AuthenticationError) -> UserError {
    match err {
        AuthenticationError::InvalidCredentials => UserError::InvalidCredentials,
        AuthenticationError::PasswordError(e) => UserError::Hashing(e.to_string()),
    }
}

#[async_trait]
impl<UR, IS> UserServicePort for UserService<UR, IS>
where
    UR: UserRepository,
    IS: ImageStore,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<Registration, UserError> {
        if self
            .repository
            .find_by_username(&command.username)
            .await?
            .is_some()
        {
            return Err(UserError::UsernameAlreadyExists(
                command.username.to_string(),
            ));
        }

        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(UserError::EmailAlreadyExists(
                command.email.as_str().to_string(),
            ));
        }

        let password_hash = self
            .authenticator
            .hash_password(command.password.expose())
            .map_err(|e| UserError::Hashing(e.to_string()))?;

        let mut warnings = Vec::new();
        let profile_image = match command.profile_image {
            Some(upload) => self.store_profile_image(upload, &mut warnings).await?,
            None => None,
        };

        let new_user = NewUser {
            role: command.role,
            first_name: command.first_name,
            last_name: command.last_name,
            username: command.username,
            email: command.email,
            password_hash,
            profile_image: profile_image.clone(),
            address: command.address,
            created_at: Utc::now(),
        };

        match self.repository.create(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = ?user.role, "User registered");
                Ok(Registration { user, warnings })
            }
            Err(e) => {
                // Lost a uniqueness race or the insert failed: the image has no owner
                if let Some(name) = profile_image {
                    if let Err(remove_err) = self.image_store.remove(&name).await {
                        tracing::error!(
                            image = %name.as_str(),
                            error = %remove_err,
                            "Failed to remove orphaned profile image"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<User, UserError> {
        let password = credentials.password.expose();

        let user = match Username::new(credentials.username) {
            Ok(username) => self.repository.find_by_username(&username).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            return Err(credential_error(
                self.authenticator.reject_unknown_account(password),
            ));
        };

        self.authenticator
            .verify_password(password, &user.password_hash)
            .map_err(credential_error)?;

        tracing::info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }
}
