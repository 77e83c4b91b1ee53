//! Request and response bodies of the Instance API volume endpoints.

use serde::{Deserialize, Serialize};

use crate::api::{CreateVolumeRequest, RemoteVolume, UpdateVolumeRequest};
use crate::volume::VolumeType;

/// Body of `POST /zones/{zone}/volumes`.
#[derive(Debug, Serialize)]
pub(super) struct CreateVolumeBody<'a> {
    name: &'a str,
    volume_type: VolumeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_volume: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_snapshot: Option<&'a str>,
}

impl<'a> From<&'a CreateVolumeRequest> for CreateVolumeBody<'a> {
    fn from(request: &'a CreateVolumeRequest) -> Self {
        Self {
            name: &request.name,
            volume_type: request.volume_type,
            project: request.project_id.as_deref(),
            size: request.size_bytes,
            base_volume: request.base_volume.as_deref(),
            base_snapshot: request.base_snapshot.as_deref(),
        }
    }
}

/// Body of `PATCH /zones/{zone}/volumes/{id}`.
#[derive(Debug, Serialize)]
pub(super) struct UpdateVolumeBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

impl<'a> From<&'a UpdateVolumeRequest> for UpdateVolumeBody<'a> {
    fn from(request: &'a UpdateVolumeRequest) -> Self {
        Self {
            name: request.name.as_deref(),
            size: request.size_bytes,
        }
    }
}

/// Envelope returned by every endpoint that answers with a volume.
#[derive(Debug, Deserialize)]
pub(super) struct VolumeEnvelope {
    pub(super) volume: WireVolume,
}

#[derive(Debug, Deserialize)]
pub(super) struct WireVolume {
    id: String,
    #[serde(default)]
    name: String,
    volume_type: VolumeType,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    project: String,
    #[serde(default)]
    organization: String,
    zone: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    server: Option<ServerRef>,
}

#[derive(Debug, Deserialize)]
struct ServerRef {
    id: String,
}

impl From<WireVolume> for RemoteVolume {
    fn from(volume: WireVolume) -> Self {
        Self {
            id: volume.id,
            name: volume.name,
            volume_type: volume.volume_type,
            size_bytes: volume.size,
            project: volume.project,
            organization: volume.organization,
            zone: volume.zone,
            state: volume.state,
            server_id: volume.server.map(|server| server.id),
        }
    }
}

/// Error body returned by Scaleway APIs; only the message is surfaced.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub(super) message: String,
}
