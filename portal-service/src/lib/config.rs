use std::env;
use std::path::PathBuf;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Secret shipped in `config/default.toml`; only acceptable for local development.
pub const DEVELOPMENT_SECRET: &str = "dev-please-change";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub uploads: UploadsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub directory: PathBuf,
    pub max_request_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, SESSION__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("database.url", "sqlite://instance/portal.sqlite3")?
            .set_default("database.max_connections", 5)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.http_port", 8080)?
            .set_default("session.secret", DEVELOPMENT_SECRET)?
            .set_default("session.expiration_hours", 24)?
            .set_default("session.secure_cookie", false)?
            .set_default("uploads.directory", "static/uploads")?
            .set_default("uploads.max_request_bytes", 5 * 1024 * 1024)?
            .set_default(
                "uploads.allowed_extensions",
                vec!["png", "jpg", "jpeg", "gif"],
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: UPLOADS__ALLOWED_EXTENSIONS=png,webp overrides uploads.allowed_extensions
            .add_source(
                Environment::default()
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("uploads.allowed_extensions")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "session.secret must not be empty".to_string(),
            ));
        }
        if self.session.expiration_hours <= 0 {
            return Err(ConfigError::Message(
                "session.expiration_hours must be positive".to_string(),
            ));
        }
        if self.uploads.allowed_extensions.is_empty() {
            return Err(ConfigError::Message(
                "uploads.allowed_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    pub fn uses_development_secret(&self) -> bool {
        self.session.secret == DEVELOPMENT_SECRET
    }
}
