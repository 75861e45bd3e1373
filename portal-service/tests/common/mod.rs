#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use portal_service::app;
use portal_service::config::Config;
use portal_service::config::DatabaseConfig;
use portal_service::config::ServerConfig;
use portal_service::config::SessionConfig;
use portal_service::config::UploadsConfig;
use reqwest::multipart::Form;
use reqwest::multipart::Part;
use reqwest::redirect::Policy;
use sqlx::SqlitePool;
use tempfile::TempDir;

pub const TEST_SECRET: &str = "test-secret-key-for-session-signing-at-least-32-bytes";
pub const PASSWORD: &str = "pass_word!";

/// Test application that spawns a real server over a throwaway database
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub pool: SqlitePool,
    pub uploads: PathBuf,
    pub api_client: reqwest::Client,
    // Keeps the database file and upload area alive for the test's duration
    _root: TempDir,
}

/// Configuration pointing every path into `root`
pub fn test_config(root: &Path) -> Config {
    Config {
        database: DatabaseConfig {
            url: format!("sqlite://{}", root.join("portal.sqlite3").display()),
            max_connections: 5,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            http_port: 0,
        },
        session: SessionConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 24,
            secure_cookie: false,
        },
        uploads: UploadsConfig {
            directory: root.join("uploads"),
            max_request_bytes: 5 * 1024 * 1024,
            allowed_extensions: ["png", "jpg", "jpeg", "gif"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        },
    }
}

/// Client that keeps cookies but never follows redirects, so tests see every 303
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create reqwest client")
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(root.path());

        let pool = app::connect_database(&config.database)
            .await
            .expect("Failed to open test database");
        app::migrate(&pool).await.expect("Failed to run migrations");
        let router = app::build_router(&config, pool.clone())
            .await
            .expect("Failed to build router");

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            pool,
            uploads: config.uploads.directory.clone(),
            api_client: client(),
            _root: root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(self.url(path))
    }

    /// Submit the signup form
    pub async fn register(&self, form: Form) -> reqwest::Response {
        self.post("/signup")
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register an account as setup, reading the page that shows the
    /// "Account created!" flash so later pages start with no pending flashes
    pub async fn register_user(&self, form: Form) {
        let response = self.register(form).await;
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
        self.get("/login")
            .send()
            .await
            .expect("Failed to execute request");
    }

    /// Submit the login form
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/login")
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn user_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count users")
    }
}

/// A complete, valid signup form
pub fn signup_form(role: &str, username: &str, email: &str) -> Form {
    Form::new()
        .text("role", role.to_string())
        .text("first_name", "Nicola")
        .text("last_name", "Rossi")
        .text("username", username.to_string())
        .text("email", email.to_string())
        .text("password", PASSWORD)
        .text("confirm_password", PASSWORD)
        .text("address_line1", "Via Roma 1")
        .text("city", "Torino")
        .text("state", "TO")
        .text("postal_code", "10121")
}

pub fn with_image(form: Form, filename: &str, bytes: &[u8]) -> Form {
    form.part(
        "profile_image",
        Part::bytes(bytes.to_vec()).file_name(filename.to_string()),
    )
}

pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .expect("Location is not text")
}
