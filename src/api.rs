//! Contract of the remote Instance API consumed by the reconciler.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::volume::VolumeType;

/// Volume state reported once no operation is in flight.
pub const STATE_AVAILABLE: &str = "available";
/// Volume state reported when the provider gave up on an operation.
pub const STATE_ERROR: &str = "error";

/// Parameters for `CreateVolume`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateVolumeRequest {
    /// Zone hosting the new volume.
    pub zone: String,
    /// Volume name.
    pub name: String,
    /// Storage class.
    pub volume_type: VolumeType,
    /// Owning project, when not left to the credentials' default.
    pub project_id: Option<String>,
    /// Size in bytes for a blank volume.
    pub size_bytes: Option<u64>,
    /// Volume to copy.
    pub base_volume: Option<String>,
    /// Snapshot to restore.
    pub base_snapshot: Option<String>,
}

/// Parameters for `UpdateVolume`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateVolumeRequest {
    /// Zone hosting the volume.
    pub zone: String,
    /// Provider volume identifier.
    pub volume_id: String,
    /// New name, if renaming.
    pub name: Option<String>,
    /// New size in bytes, if resizing.
    pub size_bytes: Option<u64>,
}

/// Volume as reported by the provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteVolume {
    /// Provider volume identifier.
    pub id: String,
    /// Volume name.
    pub name: String,
    /// Storage class.
    pub volume_type: VolumeType,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Owning project.
    pub project: String,
    /// Owning organization.
    pub organization: String,
    /// Zone hosting the volume.
    pub zone: String,
    /// Lifecycle state (`available`, `resizing`, `error`, ...).
    pub state: String,
    /// Server the volume is attached to, if any.
    pub server_id: Option<String>,
}

impl RemoteVolume {
    /// Reports whether no provider operation is in flight.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.state == STATE_AVAILABLE || self.state == STATE_ERROR
    }
}

/// Errors returned by an [`InstanceApi`] implementation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// The addressed volume does not exist.
    #[error("volume {volume_id} not found in zone {zone}")]
    NotFound {
        /// Zone used for the lookup.
        zone: String,
        /// Volume identifier that was not found.
        volume_id: String,
    },
    /// The provider rejected the request.
    #[error("provider error{}: {message}", .status.map(|code| format!(" ({code})")).unwrap_or_default())]
    Provider {
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Message returned by the provider.
        message: String,
    },
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("malformed provider response: {0}")]
    Decode(String),
    /// The volume settled in the `error` state.
    #[error("volume {volume_id} is in error state")]
    VolumeFailed {
        /// Volume identifier.
        volume_id: String,
    },
    /// The volume did not settle before the wait timeout.
    #[error("timeout waiting for volume {volume_id} to leave state {state}")]
    Timeout {
        /// Volume identifier.
        volume_id: String,
        /// Last state observed.
        state: String,
    },
}

impl ApiError {
    /// Reports whether the error means the volume does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Future returned by API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Volume operations of the Instance API.
pub trait InstanceApi {
    /// Creates a volume and returns it as reported by the provider.
    fn create_volume<'a>(&'a self, request: &'a CreateVolumeRequest) -> ApiFuture<'a, RemoteVolume>;

    /// Fetches a volume, failing with [`ApiError::NotFound`] when it is gone.
    fn get_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, RemoteVolume>;

    /// Renames and/or resizes a volume.
    fn update_volume<'a>(&'a self, request: &'a UpdateVolumeRequest) -> ApiFuture<'a, RemoteVolume>;

    /// Deletes a volume.
    fn delete_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, ()>;

    /// Polls the volume every `retry_interval` until no operation is in
    /// flight, returning the settled volume.
    fn wait_for_volume<'a>(
        &'a self,
        zone: &'a str,
        volume_id: &'a str,
        retry_interval: Duration,
    ) -> ApiFuture<'a, RemoteVolume>;
}
