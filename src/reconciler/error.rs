//! Error types for the volume reconciler.

use std::fmt;

use thiserror::Error;

use crate::api::ApiError;
use crate::volume::ValidationError;

/// Remote operation that failed, used to give errors their context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// `CreateVolume`.
    Create,
    /// `GetVolume`.
    Read,
    /// `UpdateVolume` with a new name.
    Update,
    /// `UpdateVolume` with a new size.
    Resize,
    /// `WaitForVolume`.
    Wait,
    /// `DeleteVolume`, including its attachment check.
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Resize => "resize",
            Self::Wait => "wait for",
            Self::Delete => "delete",
        })
    }
}

/// Errors raised by reconciler operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VolumeError {
    /// The request was rejected before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The desired configuration changes an attribute that forces a new
    /// volume; the caller must delete and recreate instead.
    #[error("changing {attribute} requires replacing volume {volume_id}")]
    RequiresReplacement {
        /// Force-new attribute that differs.
        attribute: &'static str,
        /// Composite identifier of the volume.
        volume_id: String,
    },
    /// The volume vanished where its existence was assumed.
    #[error("volume {volume_id} not found")]
    NotFound {
        /// Composite identifier of the volume.
        volume_id: String,
    },
    /// A remote call failed and will not be retried.
    #[error("couldn't {action} volume {volume_id}: {source}")]
    Remote {
        /// Operation that failed.
        action: Action,
        /// Composite identifier, or the requested name for creation.
        volume_id: String,
        /// Underlying API failure.
        source: ApiError,
    },
    /// A bounded retry loop ran out of time.
    #[error("timeout waiting to {action} volume {volume_id}: {reason}")]
    Timeout {
        /// Operation being retried.
        action: Action,
        /// Composite identifier of the volume.
        volume_id: String,
        /// Last retryable condition observed.
        reason: String,
    },
}

impl VolumeError {
    pub(super) fn remote(action: Action, volume_id: impl fmt::Display, source: ApiError) -> Self {
        match source {
            ApiError::Timeout { state, .. } => Self::Timeout {
                action,
                volume_id: volume_id.to_string(),
                reason: format!("volume still in state {state}"),
            },
            other => Self::Remote {
                action,
                volume_id: volume_id.to_string(),
                source: other,
            },
        }
    }
}
