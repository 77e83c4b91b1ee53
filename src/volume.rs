//! Typed model of an Instance volume: desired configuration, observed state,
//! and the zone-qualified identifier shared between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of bits to shift between bytes and gigabytes (1 GB = 2^30 bytes).
const GB_SHIFT: u32 = 30;

/// Prefix used when the caller leaves the volume name empty.
const GENERATED_NAME_PREFIX: &str = "vol";

/// Errors raised when a configuration or identifier is rejected before any
/// remote call is made.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Raised when two mutually exclusive attributes are both set.
    #[error("attributes {first} and {second} are mutually exclusive")]
    ConflictingAttributes {
        /// First attribute set by the caller.
        first: &'static str,
        /// Second attribute set by the caller.
        second: &'static str,
    },
    /// Raised when the volume type is not one of the supported values.
    #[error("unsupported volume type '{0}': expected b_ssd or l_ssd")]
    UnknownVolumeType(String),
    /// Raised when a composite identifier cannot be split into zone and id.
    #[error("invalid volume id '{0}': expected <zone>/<id>")]
    InvalidZonedId(String),
    /// Raised when a source id is neither a UUID nor a zone-qualified UUID.
    #[error("invalid {attribute} '{value}': expected a UUID or <zone>/<UUID>")]
    InvalidSourceId {
        /// Attribute holding the malformed value.
        attribute: &'static str,
        /// Value supplied by the caller.
        value: String,
    },
    /// Raised when a size cannot be represented in bytes.
    #[error("size of {0} GB overflows the byte counter")]
    SizeOverflow(u64),
    /// Raised when a size change targets a volume type that cannot grow.
    #[error("only block volume can be resized")]
    ResizeNotSupported,
    /// Raised when the requested size is smaller than the current one.
    #[error("block volumes cannot be resized down (from {current} GB to {requested} GB)")]
    ResizeDown {
        /// Size currently recorded in state.
        current: u64,
        /// Size requested by the configuration.
        requested: u64,
    },
}

/// Storage class of an Instance volume.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum VolumeType {
    /// Network block storage; can be resized upward.
    #[serde(rename = "b_ssd")]
    BlockSsd,
    /// Storage local to the hypervisor; fixed size.
    #[serde(rename = "l_ssd")]
    LocalSsd,
}

impl VolumeType {
    /// Returns the wire representation used by the Instance API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BlockSsd => "b_ssd",
            Self::LocalSsd => "l_ssd",
        }
    }

    /// Reports whether volumes of this type accept a resize request.
    #[must_use]
    pub const fn is_resizable(self) -> bool {
        matches!(self, Self::BlockSsd)
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "b_ssd" => Ok(Self::BlockSsd),
            "l_ssd" => Ok(Self::LocalSsd),
            other => Err(ValidationError::UnknownVolumeType(other.to_owned())),
        }
    }
}

/// Converts a size in gigabytes to bytes.
///
/// # Errors
///
/// Returns [`ValidationError::SizeOverflow`] when the result does not fit in
/// a `u64`.
pub const fn gb_to_bytes(size_in_gb: u64) -> Result<u64, ValidationError> {
    match size_in_gb.checked_mul(1 << GB_SHIFT) {
        Some(bytes) => Ok(bytes),
        None => Err(ValidationError::SizeOverflow(size_in_gb)),
    }
}

/// Converts a byte count to whole gigabytes, rounding down.
#[must_use]
pub const fn bytes_to_gb(bytes: u64) -> u64 {
    bytes >> GB_SHIFT
}

/// Zone-qualified volume identifier, rendered as `{zone}/{id}`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ZonedId {
    /// Availability zone hosting the volume.
    pub zone: String,
    /// Provider identifier of the volume within the zone.
    pub id: String,
}

impl ZonedId {
    /// Builds an identifier from its two halves.
    #[must_use]
    pub fn new(zone: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ZonedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.id)
    }
}

impl FromStr for ZonedId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.split_once('/') {
            Some((zone, id)) if !zone.is_empty() && !id.is_empty() && !id.contains('/') => {
                Ok(Self::new(zone, id))
            }
            _ => Err(ValidationError::InvalidZonedId(trimmed.to_owned())),
        }
    }
}

impl Serialize for ZonedId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ZonedId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Accepts `UUID` or `zone/UUID` and returns the bare UUID string.
fn expand_source_id(attribute: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let candidate = trimmed
        .split_once('/')
        .map_or(trimmed, |(_zone, id)| id);
    Uuid::parse_str(candidate)
        .map(|_| candidate.to_owned())
        .map_err(|_| ValidationError::InvalidSourceId {
            attribute,
            value: trimmed.to_owned(),
        })
}

/// Content used to seed a volume at creation time.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum VolumeSource {
    /// No explicit size or source; the provider applies its default.
    #[default]
    Empty,
    /// Blank volume of the given size in gigabytes.
    Size(u64),
    /// Copy of an existing volume (bare UUID).
    FromVolume(String),
    /// Volume restored from a snapshot (bare UUID).
    FromSnapshot(String),
}

impl VolumeSource {
    /// Requested size in gigabytes, when the source is a blank volume.
    #[must_use]
    pub const fn size_in_gb(&self) -> Option<u64> {
        match self {
            Self::Size(size) => Some(*size),
            _ => None,
        }
    }

    /// Source volume id, when the volume is a copy.
    #[must_use]
    pub fn from_volume_id(&self) -> Option<&str> {
        match self {
            Self::FromVolume(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Source snapshot id, when the volume is restored from a snapshot.
    #[must_use]
    pub fn from_snapshot_id(&self) -> Option<&str> {
        match self {
            Self::FromSnapshot(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Desired configuration of a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeConfig {
    /// Volume name; generated at creation when absent.
    pub name: Option<String>,
    /// Storage class; immutable once created.
    pub volume_type: VolumeType,
    /// Size or seed content.
    pub source: VolumeSource,
    /// Target zone; falls back to the reconciler default.
    pub zone: Option<String>,
    /// Owning project; falls back to the reconciler default.
    pub project_id: Option<String>,
}

impl VolumeConfig {
    /// Starts a builder for a volume of the given type.
    #[must_use]
    pub fn builder(volume_type: VolumeType) -> VolumeConfigBuilder {
        VolumeConfigBuilder::new(volume_type)
    }

    /// Returns the configured name, or a fresh `vol-<uuid>` name.
    #[must_use]
    pub fn name_or_generated(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{GENERATED_NAME_PREFIX}-{}", Uuid::new_v4().simple()))
    }

    /// Derives the configuration that describes an existing volume, keeping
    /// its placement, type, and seed so that only mutable fields differ.
    #[must_use]
    pub fn from_state(state: &VolumeState) -> Self {
        let source = match (&state.from_volume_id, &state.from_snapshot_id) {
            (Some(volume_id), _) => VolumeSource::FromVolume(volume_id.clone()),
            (None, Some(snapshot_id)) => VolumeSource::FromSnapshot(snapshot_id.clone()),
            (None, None) => VolumeSource::Size(state.size_in_gb),
        };
        Self {
            name: Some(state.name.clone()),
            volume_type: state.volume_type,
            source,
            zone: Some(state.zone.clone()),
            project_id: Some(state.project_id.clone()),
        }
    }
}

/// Builder for [`VolumeConfig`] that enforces the mutual exclusion of size and
/// source attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeConfigBuilder {
    name: Option<String>,
    volume_type: VolumeType,
    size_in_gb: Option<u64>,
    from_volume_id: Option<String>,
    from_snapshot_id: Option<String>,
    zone: Option<String>,
    project_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}

impl VolumeConfigBuilder {
    /// Creates a builder with only the volume type set.
    #[must_use]
    pub const fn new(volume_type: VolumeType) -> Self {
        Self {
            name: None,
            volume_type,
            size_in_gb: None,
            from_volume_id: None,
            from_snapshot_id: None,
            zone: None,
            project_id: None,
        }
    }

    /// Sets the volume name.
    #[must_use]
    pub fn name(mut self, value: Option<String>) -> Self {
        self.name = value;
        self
    }

    /// Sets the size in gigabytes.
    #[must_use]
    pub const fn size_in_gb(mut self, value: Option<u64>) -> Self {
        self.size_in_gb = value;
        self
    }

    /// Sets the id of a volume to copy.
    #[must_use]
    pub fn from_volume_id(mut self, value: Option<String>) -> Self {
        self.from_volume_id = value;
        self
    }

    /// Sets the id of a snapshot to restore.
    #[must_use]
    pub fn from_snapshot_id(mut self, value: Option<String>) -> Self {
        self.from_snapshot_id = value;
        self
    }

    /// Sets the target zone.
    #[must_use]
    pub fn zone(mut self, value: Option<String>) -> Self {
        self.zone = value;
        self
    }

    /// Sets the owning project.
    #[must_use]
    pub fn project_id(mut self, value: Option<String>) -> Self {
        self.project_id = value;
        self
    }

    /// Validates and builds the configuration. Blank strings count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConflictingAttributes`] when more than one of
    /// size, source volume, and source snapshot is set, and
    /// [`ValidationError::InvalidSourceId`] when a source id is malformed.
    pub fn build(self) -> Result<VolumeConfig, ValidationError> {
        let from_volume = non_empty(self.from_volume_id);
        let from_snapshot = non_empty(self.from_snapshot_id);

        let source = match (self.size_in_gb, from_volume, from_snapshot) {
            (None, None, None) => VolumeSource::Empty,
            (Some(size), None, None) => VolumeSource::Size(size),
            (None, Some(volume_id), None) => {
                VolumeSource::FromVolume(expand_source_id("from_volume_id", &volume_id)?)
            }
            (None, None, Some(snapshot_id)) => {
                VolumeSource::FromSnapshot(expand_source_id("from_snapshot_id", &snapshot_id)?)
            }
            (Some(_), Some(_), _) => {
                return Err(ValidationError::ConflictingAttributes {
                    first: "size_in_gb",
                    second: "from_volume_id",
                });
            }
            (Some(_), None, Some(_)) => {
                return Err(ValidationError::ConflictingAttributes {
                    first: "size_in_gb",
                    second: "from_snapshot_id",
                });
            }
            (None, Some(_), Some(_)) => {
                return Err(ValidationError::ConflictingAttributes {
                    first: "from_volume_id",
                    second: "from_snapshot_id",
                });
            }
        };

        Ok(VolumeConfig {
            name: non_empty(self.name),
            volume_type: self.volume_type,
            source,
            zone: non_empty(self.zone),
            project_id: non_empty(self.project_id),
        })
    }
}

/// Merged desired and observed attributes of a created volume.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VolumeState {
    /// Composite identifier assigned at creation.
    pub id: ZonedId,
    /// Current volume name.
    pub name: String,
    /// Storage class.
    #[serde(rename = "type")]
    pub volume_type: VolumeType,
    /// Size in whole gigabytes, rounded down.
    pub size_in_gb: u64,
    /// Volume copied at creation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_volume_id: Option<String>,
    /// Snapshot restored at creation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_snapshot_id: Option<String>,
    /// Server the volume is attached to, if any.
    pub server_id: Option<String>,
    /// Zone hosting the volume.
    pub zone: String,
    /// Owning project.
    pub project_id: String,
    /// Owning organization.
    pub organization_id: String,
}

impl VolumeState {
    /// Carries the seed ids recorded in `prior` over to this state. The
    /// provider never reports them, so they only live in recorded state.
    #[must_use]
    pub fn with_seed_of(mut self, prior: &Self) -> Self {
        self.from_volume_id.clone_from(&prior.from_volume_id);
        self.from_snapshot_id.clone_from(&prior.from_snapshot_id);
        self
    }
}
