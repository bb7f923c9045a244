use std::sync::Arc;

use auth::TokenCodec;
use catalog_service::domain::user::models::UserId;
use catalog_service::domain::user::ports::AuthServicePort;
use catalog_service::domain::user::ports::UserStore;
use catalog_service::domain::user::service::AuthService;
use catalog_service::inbound::http::router::create_router;
use catalog_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;
use serde_json::Value;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server over an in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub repository: InMemoryUserRepository,
    pub codec: Arc<TokenCodec>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = InMemoryUserRepository::new();
        let codec = Arc::new(TokenCodec::new(TEST_SECRET));
        let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
            Arc::new(repository.clone()),
            Arc::clone(&codec),
        ));

        let router = create_router(auth_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            repository,
            codec,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(&format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.put(path).bearer_auth(token)
    }

    /// Register a user and return its ID
    pub async fn register(&self, email: &str, password: &str) -> i64 {
        let response = self
            .post("/v1/register")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["id"].as_i64().expect("Missing user ID")
    }

    /// Log in and return `(access_token, refresh_token)`
    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .post("/v1/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        token_pair(response.json().await.expect("Failed to parse response"))
    }

    /// Register a user, grant admin rights directly in the store, and log in
    pub async fn admin_access_token(&self) -> String {
        let id = self.register("admin@example.com", "admin_pass").await;
        self.repository
            .update_user_permissions(UserId(id), true)
            .await
            .expect("Failed to grant admin rights");

        self.login("admin@example.com", "admin_pass").await.0
    }
}

/// Extract `(access_token, refresh_token)` from a token pair response body
pub fn token_pair(body: Value) -> (String, String) {
    (
        body["data"]["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string(),
        body["data"]["refresh_token"]
            .as_str()
            .expect("Missing refresh token")
            .to_string(),
    )
}
