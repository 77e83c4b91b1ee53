//! Lifecycle reconciler for Scaleway Instance block volumes.
//!
//! The crate turns a desired [`VolumeConfig`] into remote calls against the
//! Instance API and maps the provider's view back into a [`VolumeState`].
//! [`VolumeReconciler`] drives create, read, update, delete, and import on
//! top of any [`InstanceApi`]; [`ScalewayInstanceApi`] is the HTTP
//! implementation used by the `scw-volume` binary.

pub mod api;
pub mod config;
pub mod reconciler;
pub mod scaleway;
pub mod schema;
pub mod test_support;
pub mod volume;

pub use api::{ApiError, InstanceApi, RemoteVolume};
pub use config::{ConfigError, ScalewayConfig};
pub use reconciler::{Action, Placement, VolumeError, VolumeReconciler};
pub use scaleway::ScalewayInstanceApi;
pub use schema::{Plan, VOLUME_SCHEMA, VolumeDiff};
pub use volume::{
    ValidationError, VolumeConfig, VolumeConfigBuilder, VolumeSource, VolumeState, VolumeType,
    ZonedId,
};
