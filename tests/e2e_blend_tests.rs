//! End-to-end tests for blend profiles and sample matching

mod common;

use common::{TestClient, TestServer, DEVICE_1_ID, DEVICE_2_ID};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn sample(r1: f64, r2: f64, r3: f64) -> Value {
    json!({
        "sample_name": "cupping",
        "sensor_reading_1": r1,
        "sensor_reading_2": r2,
        "sensor_reading_3": r3,
        "chemical_data": {"caffeine": 1.2},
        "notes": "morning batch"
    })
}

fn readings(r1: f64, r2: f64, r3: f64) -> Value {
    json!({"sensor_reading_1": r1, "sensor_reading_2": r2, "sensor_reading_3": r3})
}

#[tokio::test]
async fn test_create_and_list_profiles() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .create_profile(
            DEVICE_1_ID,
            "Dark Roast",
            json!([sample(2.0, 4.0, 6.0), sample(4.0, 4.0, 6.0)]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["sample_count"], 2);
    assert_eq!(created["signature"]["avg_reading_1"], 3.0);
    assert_eq!(created["signature"]["std_reading_1"], 1.0);
    assert_eq!(created["signature"]["std_reading_2"], 0.0);

    let response = client.list_profiles(DEVICE_1_ID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["device_id"], DEVICE_1_ID);
    assert_eq!(body["total_count"], 1);

    let profile = &body["profiles"][0];
    assert_eq!(profile["profile_name"], "Dark Roast");
    assert_eq!(profile["description"], "Dark Roast reference");
    assert_eq!(profile["samples"].as_array().unwrap().len(), 2);
    assert_eq!(profile["samples"][0]["chemical_data"]["caffeine"], 1.2);
}

#[tokio::test]
async fn test_profiles_are_scoped_to_device() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile_id = client
        .create_profile_id(DEVICE_1_ID, "House Blend", json!([sample(1.0, 2.0, 3.0)]))
        .await;

    let body: Value = client.list_profiles(DEVICE_2_ID).await.json().await.unwrap();
    assert_eq!(body["total_count"], 0);

    let response = client.get_profile(DEVICE_2_ID, profile_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.delete_profile(DEVICE_2_ID, profile_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .add_sample(DEVICE_2_ID, profile_id, sample(1.0, 2.0, 3.0))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = client
        .match_sample(DEVICE_2_ID, readings(1.0, 2.0, 3.0))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total_profiles"], 0);
    assert!(body["best_match"].is_null());

    let response = client.get_profile(DEVICE_1_ID, profile_id).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_sample_recomputes_signature() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile_id = client
        .create_profile_id(
            DEVICE_1_ID,
            "Single Origin",
            json!([sample(2.0, 4.0, 6.0), sample(4.0, 4.0, 6.0)]),
        )
        .await;

    let response = client
        .add_sample(DEVICE_1_ID, profile_id, sample(6.0, 4.0, 6.0))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["profile_id"], profile_id);
    assert_eq!(body["sample_count"], 3);
    assert_eq!(body["updated_signature"]["avg_reading_1"], 4.0);
    let std_1 = body["updated_signature"]["std_reading_1"].as_f64().unwrap();
    assert!((std_1 - (8.0f64 / 3.0).sqrt()).abs() < 1e-9);

    let profile: Value = client
        .get_profile(DEVICE_1_ID, profile_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["sample_count"], 3);
    assert_eq!(profile["samples"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_match_ranks_profiles_by_combined_score() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let rising = client
        .create_profile_id(DEVICE_1_ID, "Rising", json!([sample(1.0, 2.0, 3.0)]))
        .await;
    let falling = client
        .create_profile_id(DEVICE_1_ID, "Falling", json!([sample(3.0, 2.0, 1.0)]))
        .await;

    let response = client
        .match_sample(DEVICE_1_ID, readings(1.0, 2.0, 3.0))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_profiles"], 2);
    assert_eq!(body["sample_readings"], json!([1.0, 2.0, 3.0]));

    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["profile_id"], rising);
    assert_eq!(matches[1]["profile_id"], falling);
    assert!(
        matches[0]["combined_score"].as_f64().unwrap()
            > matches[1]["combined_score"].as_f64().unwrap()
    );

    assert_eq!(body["best_match"]["profile_id"], rising);
    assert_eq!(body["best_match"]["combined_score"], 100.0);
    assert_eq!(body["best_match"]["recommendation"], "excellent");
    assert!(body["best_match"]["recommendation_label"]
        .as_str()
        .unwrap()
        .starts_with("Excellent"));
}

#[tokio::test]
async fn test_match_rejects_zero_readings() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.match_sample(DEVICE_1_ID, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_profile_validation() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.create_profile(DEVICE_1_ID, "Empty", json!([])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .create_profile(DEVICE_1_ID, "  ", json!([sample(1.0, 1.0, 1.0)]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_profile_removes_it_from_matching() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let profile_id = client
        .create_profile_id(DEVICE_1_ID, "Decaf", json!([sample(5.0, 5.0, 5.0)]))
        .await;

    let response = client.delete_profile(DEVICE_1_ID, profile_id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get_profile(DEVICE_1_ID, profile_id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .add_sample(DEVICE_1_ID, profile_id, sample(5.0, 5.0, 5.0))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = client
        .match_sample(DEVICE_1_ID, readings(5.0, 5.0, 5.0))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["total_profiles"], 0);
    assert_eq!(body["matches"], json!([]));
}
