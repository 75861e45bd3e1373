use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use sqlx::SqlitePool;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ImageFilename;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::PersonName;
use crate::domain::user::models::PostalAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const SELECT_USER: &str = r#"
    SELECT id, role, first_name, last_name, username, email, password_hash,
           profile_image, address_line1, city, state, postal_code, created_at
    FROM users
"#;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User, UserError> {
        let column = |e: sqlx::Error| UserError::DatabaseError(e.to_string());

        let profile_image: Option<String> = row.try_get("profile_image").map_err(column)?;
        let profile_image = match profile_image {
            Some(name) => {
                let stored = ImageFilename::from_stored(name.clone());
                if stored.is_none() {
                    tracing::warn!(profile_image = %name, "Ignoring unusable stored image name");
                }
                stored
            }
            None => None,
        };

        Ok(User {
            id: UserId(row.try_get("id").map_err(column)?),
            role: Role::from_code(row.try_get("role").map_err(column)?)?,
            first_name: PersonName::new(row.try_get("first_name").map_err(column)?)?,
            last_name: PersonName::new(row.try_get("last_name").map_err(column)?)?,
            username: Username::new(row.try_get("username").map_err(column)?)?,
            email: EmailAddress::new(row.try_get("email").map_err(column)?)?,
            password_hash: row.try_get("password_hash").map_err(column)?,
            profile_image,
            address: PostalAddress::new(
                row.try_get("address_line1").map_err(column)?,
                row.try_get("city").map_err(column)?,
                row.try_get("state").map_err(column)?,
                row.try_get("postal_code").map_err(column)?,
            )?,
            created_at: row.try_get("created_at").map_err(column)?,
        })
    }

    async fn find_one(&self, clause: &str, value: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE {clause}"))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                role, first_name, last_name, username, email, password_hash,
                profile_image, address_line1, city, state, postal_code, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.role.code())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.profile_image.as_ref().map(ImageFilename::as_str))
        .bind(user.address.line1())
        .bind(user.address.city())
        .bind(user.address.state())
        .bind(user.address.postal_code())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    // SQLite reports the violated columns only in the message
                    if db_err.message().contains("users.username") {
                        return UserError::UsernameAlreadyExists(
                            user.username.as_str().to_string(),
                        );
                    }
                    if db_err.message().contains("users.email") {
                        return UserError::EmailAlreadyExists(user.email.as_str().to_string());
                    }
                }
            }
            UserError::DatabaseError(e.to_string())
        })?;

        Ok(user.with_id(UserId(result.last_insert_rowid())))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        self.find_one("username = ?", username.as_str()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        self.find_one("email = ?", email).await
    }
}
