//! In-place rename and resize.

use tracing::{debug, info};

use crate::api::{InstanceApi, UpdateVolumeRequest};
use crate::schema::{Plan, plan};
use crate::volume::{VolumeConfig, VolumeState, ZonedId, gb_to_bytes};

use super::{Action, VolumeError, VolumeReconciler};

impl<A: InstanceApi> VolumeReconciler<A> {
    /// Converges the volume recorded in `prior` towards `desired`.
    ///
    /// Every check runs before the first remote call, so a rejected update
    /// leaves the volume untouched. A resize waits for the volume to settle
    /// both before the request and after it, since the provider rejects a
    /// resize while another operation is in flight and applies it
    /// asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::RequiresReplacement`] when a force-new attribute
    /// differs, [`VolumeError::Validation`] for a shrink or a resize of a
    /// local volume, [`VolumeError::Remote`] or [`VolumeError::Timeout`] when
    /// a remote step fails, and [`VolumeError::NotFound`] when the volume is
    /// gone by the final read.
    pub async fn update(
        &self,
        prior: &VolumeState,
        desired: &VolumeConfig,
    ) -> Result<VolumeState, VolumeError> {
        let diff = match plan(prior, desired)? {
            Plan::Update(diff) => diff,
            Plan::Replace { attribute } => {
                return Err(VolumeError::RequiresReplacement {
                    attribute,
                    volume_id: prior.id.to_string(),
                });
            }
        };
        let new_size_bytes = diff.resize.map(gb_to_bytes).transpose()?;

        let id = &prior.id;
        if diff.is_empty() {
            debug!(volume = %id, "volume already matches configuration");
        }

        if let Some(name) = diff.rename {
            self.api
                .update_volume(&UpdateVolumeRequest {
                    zone: id.zone.clone(),
                    volume_id: id.id.clone(),
                    name: Some(name.clone()),
                    size_bytes: None,
                })
                .await
                .map_err(|err| VolumeError::remote(Action::Update, id, err))?;
            info!(volume = %id, %name, "renamed volume");
        }

        if let Some(size_bytes) = new_size_bytes {
            self.resize(id, size_bytes).await?;
        }

        Ok(self.require(id).await?.with_seed_of(prior))
    }

    async fn resize(&self, id: &ZonedId, size_bytes: u64) -> Result<(), VolumeError> {
        self.wait_until_stable(id).await?;

        self.api
            .update_volume(&UpdateVolumeRequest {
                zone: id.zone.clone(),
                volume_id: id.id.clone(),
                name: None,
                size_bytes: Some(size_bytes),
            })
            .await
            .map_err(|err| VolumeError::remote(Action::Resize, id, err))?;
        info!(volume = %id, size_bytes, "requested volume resize");

        self.wait_until_stable(id).await
    }

    async fn wait_until_stable(&self, id: &ZonedId) -> Result<(), VolumeError> {
        let volume = self
            .api
            .wait_for_volume(&id.zone, &id.id, self.retry_interval)
            .await
            .map_err(|err| VolumeError::remote(Action::Wait, id, err))?;
        debug!(volume = %id, state = %volume.state, "volume is stable");
        Ok(())
    }
}
