//! Scaleway Instance API implementation of [`InstanceApi`].
//!
//! Volume endpoints are called over plain HTTP since the `scaleway-rs` crate
//! does not expose them.

mod wait;
mod wire;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::api::{
    ApiError, ApiFuture, CreateVolumeRequest, InstanceApi, RemoteVolume, UpdateVolumeRequest,
};
use crate::config::{ConfigError, ScalewayConfig};
use wire::{CreateVolumeBody, ErrorBody, UpdateVolumeBody, VolumeEnvelope};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_HEADER: &str = "X-Auth-Token";

/// HTTP client for the volume endpoints of the Scaleway Instance API.
#[derive(Clone, Debug)]
pub struct ScalewayInstanceApi {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    wait_timeout: Duration,
}

impl ScalewayInstanceApi {
    /// Constructs a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation or the
    /// HTTP client cannot be built.
    pub fn new(config: &ScalewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_url.trim().trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
            wait_timeout: config.wait_timeout(),
        })
    }

    /// Overrides how long [`InstanceApi::wait_for_volume`] polls before
    /// giving up.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    fn volumes_url(&self, zone: &str) -> String {
        format!("{}/zones/{zone}/volumes", self.base_url)
    }

    fn volume_url(&self, zone: &str, volume_id: &str) -> String {
        format!("{}/zones/{zone}/volumes/{volume_id}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, url, "instance api request");
        self.http
            .request(method, url)
            .header(AUTH_HEADER, &self.secret_key)
    }

    async fn send(
        builder: RequestBuilder,
        zone: &str,
        volume_id: &str,
    ) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                zone: zone.to_owned(),
                volume_id: volume_id.to_owned(),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body).map_or(body, |parsed| parsed.message);
        Err(ApiError::Provider {
            status: Some(status.as_u16()),
            message,
        })
    }

    async fn volume_from(response: Response) -> Result<RemoteVolume, ApiError> {
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let envelope: VolumeEnvelope =
            serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))?;
        Ok(envelope.volume.into())
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        zone: &str,
        volume_id: &str,
    ) -> Result<RemoteVolume, ApiError> {
        let response = Self::send(self.request(method, url).json(body), zone, volume_id).await?;
        Self::volume_from(response).await
    }

    pub(super) async fn fetch_volume(
        &self,
        zone: &str,
        volume_id: &str,
    ) -> Result<RemoteVolume, ApiError> {
        let url = self.volume_url(zone, volume_id);
        let response = Self::send(self.request(Method::GET, &url), zone, volume_id).await?;
        Self::volume_from(response).await
    }
}

impl InstanceApi for ScalewayInstanceApi {
    fn create_volume<'a>(&'a self, request: &'a CreateVolumeRequest) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move {
            let url = self.volumes_url(&request.zone);
            let body = CreateVolumeBody::from(request);
            self.send_json(Method::POST, &url, &body, &request.zone, &request.name)
                .await
        })
    }

    fn get_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.fetch_volume(zone, volume_id).await })
    }

    fn update_volume<'a>(&'a self, request: &'a UpdateVolumeRequest) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move {
            let url = self.volume_url(&request.zone, &request.volume_id);
            let body = UpdateVolumeBody::from(request);
            self.send_json(
                Method::PATCH,
                &url,
                &body,
                &request.zone,
                &request.volume_id,
            )
            .await
        })
    }

    fn delete_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = self.volume_url(zone, volume_id);
            Self::send(self.request(Method::DELETE, &url), zone, volume_id).await?;
            Ok(())
        })
    }

    fn wait_for_volume<'a>(
        &'a self,
        zone: &'a str,
        volume_id: &'a str,
        retry_interval: Duration,
    ) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.wait_until_stable(zone, volume_id, retry_interval).await })
    }
}
