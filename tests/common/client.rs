//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all shelf server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    admin_password: Option<String>,
}

impl TestClient {
    /// Creates a client that sends no admin password
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            admin_password: None,
        }
    }

    /// Creates a client that sends `ADMIN_PASSWORD` on every request
    pub fn admin(base_url: String) -> Self {
        Self::with_password(base_url, ADMIN_PASSWORD)
    }

    pub fn with_password(base_url: String, password: &str) -> Self {
        Self {
            admin_password: Some(password.to_string()),
            ..Self::new(base_url)
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(format!("{}{}", self.base_url, path));
        match &self.admin_password {
            Some(password) => builder.header("X-Admin-Password", password),
            None => builder,
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match &self.admin_password {
            Some(password) => builder.header("X-Admin-Password", password),
            None => builder,
        }
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").send().await.expect("Home request failed")
    }

    /// GET /settings
    pub async fn settings(&self) -> Response {
        self.get("/settings")
            .send()
            .await
            .expect("Settings request failed")
    }

    /// GET /metrics
    pub async fn metrics(&self) -> Response {
        self.get("/metrics")
            .send()
            .await
            .expect("Metrics request failed")
    }

    // ========================================================================
    // Import / Export
    // ========================================================================

    /// GET /import-export/schema
    pub async fn schema(&self) -> Response {
        self.get("/import-export/schema")
            .send()
            .await
            .expect("Schema request failed")
    }

    /// GET /import-export/export
    pub async fn export(&self) -> Response {
        self.get("/import-export/export")
            .send()
            .await
            .expect("Export request failed")
    }

    /// POST /import-export/validate
    pub async fn validate(&self, csv_data: &str) -> Response {
        self.post_json("/import-export/validate", json!({ "csv_data": csv_data }))
            .await
    }

    /// POST /import-export/import
    pub async fn import(&self, csv_data: &str, mode: &str) -> Response {
        self.post_json(
            "/import-export/import",
            json!({ "csv_data": csv_data, "mode": mode }),
        )
        .await
    }

    /// POST with an arbitrary JSON body, for malformed-request tests
    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> Response {
        self.post(path)
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }
}
