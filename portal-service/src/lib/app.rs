use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::Router;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqliteJournalMode;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::Config;
use crate::config::DatabaseConfig;
use crate::domain::session::service::SessionService;
use crate::domain::user::models::ImagePolicy;
use crate::domain::user::service::UserService;
use crate::inbound::http::router::create_router;
use crate::inbound::http::router::AppState;
use crate::inbound::http::router::RouterSettings;
use crate::outbound::repositories::SqliteSessionRepository;
use crate::outbound::repositories::SqliteUserRepository;
use crate::outbound::storage::FilesystemImageStore;
use crate::user::errors::ImageStoreError;

/// Failures while bringing the service up
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),

    #[error("Upload area error: {0}")]
    Uploads(#[from] ImageStoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the SQLite pool, creating the database file (and its directory) on first use.
pub async fn connect_database(config: &DatabaseConfig) -> Result<SqlitePool, StartupError> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let filename = options.clone().get_filename();
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    tracing::info!(
        max_connections = config.max_connections,
        database = "sqlite",
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StartupError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!(database = "sqlite", "Database migrations completed");
    Ok(())
}

/// Wire repositories, services and the HTTP router together.
pub async fn build_router(config: &Config, pool: SqlitePool) -> Result<Router, StartupError> {
    let authenticator = Arc::new(Authenticator::new(config.session.secret.as_bytes()));

    let image_store = Arc::new(FilesystemImageStore::new(&config.uploads.directory));
    image_store.ensure_directory().await?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let session_repository = Arc::new(SqliteSessionRepository::new(pool));

    let user_service = Arc::new(UserService::new(
        Arc::clone(&user_repository),
        image_store,
        Arc::clone(&authenticator),
        ImagePolicy::new(&config.uploads.allowed_extensions),
    ));
    let session_service = Arc::new(SessionService::new(
        session_repository,
        user_repository,
        Arc::clone(&authenticator),
        chrono::Duration::hours(config.session.expiration_hours),
    ));

    let state = AppState {
        user_service,
        session_service,
        authenticator,
        secure_cookies: config.session.secure_cookie,
    };

    Ok(create_router(
        state,
        RouterSettings {
            uploads_directory: &config.uploads.directory,
            max_request_bytes: config.uploads.max_request_bytes,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_database_creates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let database = root.path().join("var/data/portal.sqlite3");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", database.display()),
            max_connections: 1,
        };

        let pool = connect_database(&config).await.unwrap();
        migrate(&pool).await.unwrap();

        assert!(database.exists());
    }
}
