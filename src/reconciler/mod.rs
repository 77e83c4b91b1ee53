//! Lifecycle reconciler for Instance volumes.
//!
//! Each operation takes the desired configuration or recorded state and
//! issues the remote calls needed to converge, then re-reads the volume so
//! the returned [`VolumeState`] always reflects what the provider reports.

mod delete;
mod error;
mod update;

use std::time::Duration;

use tracing::{debug, info};

use crate::api::{CreateVolumeRequest, InstanceApi, RemoteVolume};
use crate::volume::{VolumeConfig, VolumeState, ZonedId, bytes_to_gb, gb_to_bytes};

pub use error::{Action, VolumeError};

/// Interval between two polls of a volume's state.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
/// Overall deadline for the delete loop while the volume stays attached.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(600);

/// Placement applied when a configuration leaves zone or project unset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    /// Zone used when the configuration has none.
    pub zone: String,
    /// Project used when the configuration has none.
    pub project_id: Option<String>,
}

impl Placement {
    /// Creates placement defaults.
    #[must_use]
    pub fn new(zone: impl Into<String>, project_id: Option<String>) -> Self {
        Self {
            zone: zone.into(),
            project_id,
        }
    }
}

/// Reconciles Instance volumes against a remote [`InstanceApi`].
#[derive(Clone, Debug)]
pub struct VolumeReconciler<A> {
    api: A,
    placement: Placement,
    retry_interval: Duration,
    delete_timeout: Duration,
}

impl<A: InstanceApi> VolumeReconciler<A> {
    /// Creates a reconciler with the default retry interval and delete
    /// timeout.
    #[must_use]
    pub const fn new(api: A, placement: Placement) -> Self {
        Self {
            api,
            placement,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
        }
    }

    /// Overrides the polling interval used by stability and detachment waits.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Overrides the overall deadline of [`Self::delete`].
    #[must_use]
    pub const fn with_delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    /// Returns the underlying API client.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Creates the volume described by `config` and returns its state as
    /// read back from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Validation`] when the size overflows,
    /// [`VolumeError::Remote`] when the provider rejects the request, and
    /// [`VolumeError::NotFound`] when the volume disappears before it can be
    /// read back.
    pub async fn create(&self, config: &VolumeConfig) -> Result<VolumeState, VolumeError> {
        let zone = config
            .zone
            .clone()
            .unwrap_or_else(|| self.placement.zone.clone());
        let request = CreateVolumeRequest {
            name: config.name_or_generated(),
            volume_type: config.volume_type,
            project_id: config
                .project_id
                .clone()
                .or_else(|| self.placement.project_id.clone()),
            size_bytes: config.source.size_in_gb().map(gb_to_bytes).transpose()?,
            base_volume: config.source.from_volume_id().map(str::to_owned),
            base_snapshot: config.source.from_snapshot_id().map(str::to_owned),
            zone,
        };

        let created = self
            .api
            .create_volume(&request)
            .await
            .map_err(|err| VolumeError::remote(Action::Create, &request.name, err))?;

        let id = ZonedId::new(request.zone.clone(), created.id);
        info!(volume = %id, volume_type = %config.volume_type, "created volume");

        let mut state = self.require(&id).await?;
        state.from_volume_id = config.source.from_volume_id().map(str::to_owned);
        state.from_snapshot_id = config.source.from_snapshot_id().map(str::to_owned);
        Ok(state)
    }

    /// Refreshes the state of the volume identified by `id`.
    ///
    /// Returns `Ok(None)` when the provider no longer knows the volume, so the
    /// caller can drop it from state and recreate it on the next reconcile.
    /// Seed ids are left unset; use [`Self::refresh`] when a recorded state
    /// is at hand.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Remote`] for any failure other than not-found.
    pub async fn read(&self, id: &ZonedId) -> Result<Option<VolumeState>, VolumeError> {
        match self.api.get_volume(&id.zone, &id.id).await {
            Ok(volume) => {
                debug!(volume = %id, state = %volume.state, "read volume");
                Ok(Some(observed_state(&id.zone, volume)))
            }
            Err(err) if err.is_not_found() => {
                info!(volume = %id, "volume no longer exists; treating as deleted");
                Ok(None)
            }
            Err(err) => Err(VolumeError::remote(Action::Read, id, err)),
        }
    }

    /// Refreshes a volume from its recorded state, keeping the seed ids the
    /// provider does not report so that an unchanged configuration plans no
    /// replacement.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Remote`] for any failure other than not-found.
    pub async fn refresh(&self, prior: &VolumeState) -> Result<Option<VolumeState>, VolumeError> {
        Ok(self
            .read(&prior.id)
            .await?
            .map(|state| state.with_seed_of(prior)))
    }

    /// Adopts an existing volume from its composite identifier.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Validation`] when `raw_id` is not
    /// `<zone>/<id>`, [`VolumeError::NotFound`] when the volume does not
    /// exist, and [`VolumeError::Remote`] when the lookup fails.
    pub async fn import(&self, raw_id: &str) -> Result<VolumeState, VolumeError> {
        let id: ZonedId = raw_id.parse()?;
        self.require(&id).await
    }

    /// Reads a volume whose existence is assumed.
    async fn require(&self, id: &ZonedId) -> Result<VolumeState, VolumeError> {
        self.read(id).await?.ok_or_else(|| VolumeError::NotFound {
            volume_id: id.to_string(),
        })
    }
}

/// Copies the provider's view of a volume into a state record. Source ids are
/// not reported by the provider and are left unset.
fn observed_state(zone: &str, volume: RemoteVolume) -> VolumeState {
    VolumeState {
        id: ZonedId::new(zone, volume.id),
        name: volume.name,
        volume_type: volume.volume_type,
        size_in_gb: bytes_to_gb(volume.size_bytes),
        from_volume_id: None,
        from_snapshot_id: None,
        server_id: volume.server_id.filter(|server| !server.is_empty()),
        zone: zone.to_owned(),
        project_id: volume.project,
        organization_id: volume.organization,
    }
}
