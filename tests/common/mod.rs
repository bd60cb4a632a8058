// tests/common/mod.rs

// each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use tryout::{
    config::{Config, StorageKind},
    models::user::{ROLE_ADMIN, User},
    routes,
    state::AppState,
    store::{MemoryStore, UserStore},
    utils::{hash::hash_password, time::SystemClock},
};

pub const ADMIN_EMAIL: &str = "admin@tryout.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let body: Value = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .unwrap();
        body["token"].as_str().expect("login returned no token").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Registers a fresh participant and returns their token.
    pub async fn participant_token(&self) -> String {
        let email = format!("{}@tryout.test", uuid::Uuid::new_v4());
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({ "name": "Budi", "email": email, "password": "password123" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        self.login(&email, "password123").await
    }

    /// Creates a test and returns its id.
    pub async fn create_test(&self, token: &str, name: &str, total_question: i32) -> String {
        let response = self
            .client
            .post(self.url("/api/v1/create-test"))
            .bearer_auth(token)
            .json(&json!({
                "name": name,
                "description": "Integration test",
                "total_question": total_question
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Adds one question with two choices and returns its id.
    pub async fn create_question(&self, token: &str, test_id: &str, answer: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/v1/create-question"))
            .bearer_auth(token)
            .json(&json!({
                "test_id": test_id,
                "questions": [{
                    "question": "Capital of France?",
                    "answer": answer,
                    "choices": [{ "choice": "Paris" }, { "choice": "London" }]
                }]
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["created"][0].as_str().unwrap().to_string()
    }
}

/// Spawns the app over an in-memory store on a random port, with one admin account.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let password = hash_password(ADMIN_PASSWORD).expect("Failed to hash admin password");
    store
        .create_user(User::new("Admin", ADMIN_EMAIL, password, ROLE_ADMIN))
        .await
        .expect("Failed to seed admin");

    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        server_port: 0,
        storage: StorageKind::Memory,
        admin: None,
    };

    let app = routes::create_router(AppState::new(config, store, Arc::new(SystemClock)));

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}
