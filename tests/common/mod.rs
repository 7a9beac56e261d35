//! Common test utilities for E2E tests

use std::path::PathBuf;

use rustscribe::{AppState, build_router, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for the test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = test_config(db_path);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user and return their id
    pub async fn register(&self, email: &str, name: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/account/register"))
            .json(&serde_json::json!({
                "email": email,
                "name": name,
                "password": password,
            }))
            .send()
            .await
            .expect("register request succeeds");
        assert_eq!(response.status(), 201, "registration failed");

        let body: serde_json::Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Log a user in and return (access_token, refresh_token)
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/account/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("login request succeeds");
        assert_eq!(response.status(), 200, "login failed");

        let body: serde_json::Value = response.json().await.unwrap();
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// Register, log in, and create a blog; returns (access_token, blog_id)
    ///
    /// Logs in again after the blog creation so the token carries the
    /// author role.
    pub async fn register_author(&self, email: &str, tag: &str) -> (String, String) {
        self.register(email, "Author", "a strong password").await;
        let (token, _) = self.login(email, "a strong password").await;

        let response = self
            .client
            .post(self.url("/api/blogs"))
            .bearer_auth(&token)
            .json(&serde_json::json!({ "tag": tag, "description": "test blog" }))
            .send()
            .await
            .expect("blog creation succeeds");
        assert_eq!(response.status(), 201, "blog creation failed");
        let body: serde_json::Value = response.json().await.unwrap();
        let blog_id = body["id"].as_str().unwrap().to_string();

        let (token, _) = self.login(email, "a strong password").await;
        (token, blog_id)
    }
}

fn test_config(db_path: PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: config::DatabaseConfig { path: db_path },
        storage: config::StorageConfig {
            bucket: "test-media".to_string(),
            endpoint: "https://s3.test.example.com".to_string(),
            region: "auto".to_string(),
            access_key_id: "test-key".to_string(),
            secret_access_key: "test-secret".to_string(),
        },
        jwt: config::JwtConfig {
            secret: "test-secret-key-32-bytes-long!!!".to_string(),
            issuer: "rustscribe-test".to_string(),
            audience: "rustscribe-test".to_string(),
            access_token_lifetime_minutes: 15,
            refresh_token_lifetime_days: 7,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
