//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all coffee-analysis-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Analysis and Calibration Endpoints
    // ========================================================================

    /// POST /v1/analysis/estimate
    pub async fn estimate(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/analysis/estimate", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Estimate request failed")
    }

    /// GET /v1/calibration with the given query parameters
    pub async fn get_calibration(&self, query: &[(&str, String)]) -> Response {
        self.client
            .get(format!("{}/v1/calibration", self.base_url))
            .query(query)
            .send()
            .await
            .expect("Calibration request failed")
    }

    /// GET /v1/calibration/live
    pub async fn get_live_calibration(&self, coffee_type: i64) -> Response {
        self.client
            .get(format!("{}/v1/calibration/live", self.base_url))
            .query(&[("coffee_type", coffee_type)])
            .send()
            .await
            .expect("Live calibration request failed")
    }

    // ========================================================================
    // Blend Profile Endpoints
    // ========================================================================

    /// POST /v1/devices/{device_id}/profiles
    pub async fn create_profile(&self, device_id: &str, name: &str, samples: Value) -> Response {
        self.client
            .post(format!("{}/v1/devices/{}/profiles", self.base_url, device_id))
            .json(&json!({
                "profile_name": name,
                "description": format!("{} reference", name),
                "samples": samples,
            }))
            .send()
            .await
            .expect("Create profile request failed")
    }

    /// Creates a profile and returns its id, panicking on failure
    pub async fn create_profile_id(&self, device_id: &str, name: &str, samples: Value) -> i64 {
        let response = self.create_profile(device_id, name, samples).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.expect("Invalid profile response");
        body["profile_id"].as_i64().expect("Missing profile_id")
    }

    /// GET /v1/devices/{device_id}/profiles
    pub async fn list_profiles(&self, device_id: &str) -> Response {
        self.client
            .get(format!("{}/v1/devices/{}/profiles", self.base_url, device_id))
            .send()
            .await
            .expect("List profiles request failed")
    }

    /// GET /v1/devices/{device_id}/profiles/{profile_id}
    pub async fn get_profile(&self, device_id: &str, profile_id: i64) -> Response {
        self.client
            .get(format!(
                "{}/v1/devices/{}/profiles/{}",
                self.base_url, device_id, profile_id
            ))
            .send()
            .await
            .expect("Get profile request failed")
    }

    /// DELETE /v1/devices/{device_id}/profiles/{profile_id}
    pub async fn delete_profile(&self, device_id: &str, profile_id: i64) -> Response {
        self.client
            .delete(format!(
                "{}/v1/devices/{}/profiles/{}",
                self.base_url, device_id, profile_id
            ))
            .send()
            .await
            .expect("Delete profile request failed")
    }

    /// POST /v1/devices/{device_id}/profiles/{profile_id}/samples
    pub async fn add_sample(&self, device_id: &str, profile_id: i64, sample: Value) -> Response {
        self.client
            .post(format!(
                "{}/v1/devices/{}/profiles/{}/samples",
                self.base_url, device_id, profile_id
            ))
            .json(&sample)
            .send()
            .await
            .expect("Add sample request failed")
    }

    /// POST /v1/devices/{device_id}/match
    pub async fn match_sample(&self, device_id: &str, readings: Value) -> Response {
        self.client
            .post(format!("{}/v1/devices/{}/match", self.base_url, device_id))
            .json(&readings)
            .send()
            .await
            .expect("Match request failed")
    }
}
