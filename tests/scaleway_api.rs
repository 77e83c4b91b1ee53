//! HTTP-level tests for the Scaleway Instance API client.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use rstest::fixture;
use scw_volume::api::{CreateVolumeRequest, UpdateVolumeRequest};
use scw_volume::config::DEFAULT_API_URL;
use scw_volume::{ApiError, InstanceApi, ScalewayConfig, ScalewayInstanceApi, VolumeType};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_constants::{BYTES_PER_GB, TEST_PROJECT_ID, TEST_SECRET_KEY, TEST_ZONE};

const VOLUME_ID: &str = "0f8e7d6c-5b4a-4392-8170-6f5e4d3c2b1a";
const RETRY: Duration = Duration::from_millis(5);

#[fixture]
fn base_config() -> ScalewayConfig {
    ScalewayConfig {
        access_key: None,
        secret_key: String::from(TEST_SECRET_KEY),
        default_organization_id: None,
        default_project_id: Some(String::from(TEST_PROJECT_ID)),
        default_zone: String::from(TEST_ZONE),
        api_url: String::from(DEFAULT_API_URL),
        retry_interval_secs: 5,
        delete_timeout_secs: 600,
        wait_timeout_secs: 300,
    }
}

fn client_for(server: &MockServer) -> ScalewayInstanceApi {
    let config = ScalewayConfig {
        api_url: format!("{}/", server.uri()),
        ..base_config()
    };
    ScalewayInstanceApi::new(&config)
        .unwrap_or_else(|err| panic!("client should build: {err}"))
        .with_wait_timeout(Duration::from_millis(200))
}

fn volume_body(state: &str, size_in_gb: u64, server: Option<&str>) -> Value {
    json!({
        "volume": {
            "id": VOLUME_ID,
            "name": "data",
            "volume_type": "b_ssd",
            "size": size_in_gb * BYTES_PER_GB,
            "project": TEST_PROJECT_ID,
            "organization": "org",
            "zone": TEST_ZONE,
            "state": state,
            "server": server.map(|id| json!({"id": id, "name": "web"})),
        }
    })
}

fn volume_path() -> String {
    format!("/zones/{TEST_ZONE}/volumes/{VOLUME_ID}")
}

#[tokio::test]
async fn create_posts_body_with_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{TEST_ZONE}/volumes")))
        .and(header("X-Auth-Token", TEST_SECRET_KEY))
        .and(body_json(json!({
            "name": "data",
            "volume_type": "b_ssd",
            "project": TEST_PROJECT_ID,
            "size": 10 * BYTES_PER_GB,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(volume_body("available", 10, None)))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateVolumeRequest {
        zone: String::from(TEST_ZONE),
        name: String::from("data"),
        volume_type: VolumeType::BlockSsd,
        project_id: Some(String::from(TEST_PROJECT_ID)),
        size_bytes: Some(10 * BYTES_PER_GB),
        base_volume: None,
        base_snapshot: None,
    };
    let volume = client_for(&server)
        .create_volume(&request)
        .await
        .unwrap_or_else(|err| panic!("create should succeed: {err}"));

    assert_eq!(volume.id, VOLUME_ID);
    assert_eq!(volume.size_bytes, 10 * BYTES_PER_GB);
    assert_eq!(volume.server_id, None);
}

#[tokio::test]
async fn get_maps_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(volume_body("available", 20, Some("srv-1"))),
        )
        .mount(&server)
        .await;

    let volume = client_for(&server)
        .get_volume(TEST_ZONE, VOLUME_ID)
        .await
        .unwrap_or_else(|err| panic!("get should succeed: {err}"));

    assert_eq!(volume.server_id.as_deref(), Some("srv-1"));
    assert_eq!(volume.project, TEST_PROJECT_ID);
}

#[tokio::test]
async fn missing_volume_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "resource is not found",
            "type": "not_found",
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_volume(TEST_ZONE, VOLUME_ID)
        .await
        .expect_err("404 should fail");

    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
async fn provider_error_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(volume_path()))
        .and(body_json(json!({"size": 5 * BYTES_PER_GB})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "volume size cannot be reduced",
            "type": "invalid_arguments",
        })))
        .mount(&server)
        .await;

    let request = UpdateVolumeRequest {
        zone: String::from(TEST_ZONE),
        volume_id: String::from(VOLUME_ID),
        name: None,
        size_bytes: Some(5 * BYTES_PER_GB),
    };
    let err = client_for(&server)
        .update_volume(&request)
        .await
        .expect_err("400 should fail");

    assert_eq!(
        err,
        ApiError::Provider {
            status: Some(400),
            message: String::from("volume size cannot be reduced"),
        }
    );
}

#[tokio::test]
async fn unparseable_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_volume(TEST_ZONE, VOLUME_ID)
        .await
        .expect_err("502 should fail");

    assert!(err.to_string().contains("bad gateway"), "unexpected error: {err}");
}

#[tokio::test]
async fn delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(volume_path()))
        .and(header("X-Auth-Token", TEST_SECRET_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_volume(TEST_ZONE, VOLUME_ID)
        .await
        .unwrap_or_else(|err| panic!("delete should succeed: {err}"));
}

#[tokio::test]
async fn wait_polls_until_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("resizing", 20, None)))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("available", 20, None)))
        .mount(&server)
        .await;

    let volume = client_for(&server)
        .wait_for_volume(TEST_ZONE, VOLUME_ID, RETRY)
        .await
        .unwrap_or_else(|err| panic!("wait should succeed: {err}"));

    assert_eq!(volume.state, "available");
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn wait_reports_failed_volume() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("error", 20, None)))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .wait_for_volume(TEST_ZONE, VOLUME_ID, RETRY)
        .await
        .expect_err("error state should fail");

    assert!(
        matches!(err, ApiError::VolumeFailed { ref volume_id } if volume_id == VOLUME_ID),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn wait_times_out_on_busy_volume() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("snapshotting", 20, None)))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .with_wait_timeout(Duration::from_millis(20))
        .wait_for_volume(TEST_ZONE, VOLUME_ID, RETRY)
        .await
        .expect_err("busy volume should time out");

    assert!(
        matches!(err, ApiError::Timeout { ref state, .. } if state == "snapshotting"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn wait_with_unbounded_timeout_still_polls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("resizing", 20, None)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(volume_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_body("available", 20, None)))
        .mount(&server)
        .await;

    let volume = client_for(&server)
        .with_wait_timeout(Duration::from_secs(u64::MAX))
        .wait_for_volume(TEST_ZONE, VOLUME_ID, RETRY)
        .await
        .unwrap_or_else(|err| panic!("wait should succeed: {err}"));

    assert_eq!(volume.state, "available");
}
