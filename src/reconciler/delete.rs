//! Deletion gated on the volume being detached.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::InstanceApi;
use crate::volume::ZonedId;

use super::{Action, VolumeError, VolumeReconciler};

/// Outcome of a single delete attempt.
enum Attempt {
    /// The volume is gone, either already or because we deleted it.
    Done,
    /// The volume is still attached to the given server.
    Attached(String),
}

impl<A: InstanceApi> VolumeReconciler<A> {
    /// Deletes the volume once it is no longer attached to a server.
    ///
    /// A volume that no longer exists counts as deleted. While the volume is
    /// attached, the check is repeated every retry interval until the delete
    /// timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::Timeout`] when the volume is still attached at
    /// the deadline, and [`VolumeError::Remote`] as soon as any other check or
    /// the delete call fails.
    pub async fn delete(&self, id: &ZonedId) -> Result<(), VolumeError> {
        // An unrepresentable deadline means the loop waits for detachment.
        let deadline = Instant::now().checked_add(self.delete_timeout);
        loop {
            let server_id = match self.try_delete(id).await? {
                Attempt::Done => return Ok(()),
                Attempt::Attached(server_id) => server_id,
            };

            if deadline.is_some_and(|deadline| past_deadline(self.retry_interval, deadline)) {
                return Err(VolumeError::Timeout {
                    action: Action::Delete,
                    volume_id: id.to_string(),
                    reason: format!("volume is still attached to server {server_id}"),
                });
            }

            warn!(volume = %id, server = %server_id, "volume is still attached to a server; retrying");
            sleep(self.retry_interval).await;
        }
    }

    async fn try_delete(&self, id: &ZonedId) -> Result<Attempt, VolumeError> {
        let volume = match self.api.get_volume(&id.zone, &id.id).await {
            Ok(volume) => volume,
            Err(err) if err.is_not_found() => {
                debug!(volume = %id, "volume already gone");
                return Ok(Attempt::Done);
            }
            Err(err) => return Err(VolumeError::remote(Action::Delete, id, err)),
        };

        if let Some(server_id) = volume.server_id.filter(|server| !server.is_empty()) {
            return Ok(Attempt::Attached(server_id));
        }

        match self.api.delete_volume(&id.zone, &id.id).await {
            Ok(()) => info!(volume = %id, "deleted volume"),
            Err(err) if err.is_not_found() => debug!(volume = %id, "volume vanished before delete"),
            Err(err) => return Err(VolumeError::remote(Action::Delete, id, err)),
        }
        Ok(Attempt::Done)
    }
}

/// Reports whether another retry would end after `deadline`.
fn past_deadline(retry_interval: Duration, deadline: Instant) -> bool {
    Instant::now()
        .checked_add(retry_interval)
        .is_none_or(|next| next > deadline)
}
