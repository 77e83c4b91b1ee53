//! Stability wait for the Scaleway Instance API client.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::debug;

use crate::api::{ApiError, RemoteVolume, STATE_ERROR};

use super::ScalewayInstanceApi;

impl ScalewayInstanceApi {
    pub(super) async fn wait_until_stable(
        &self,
        zone: &str,
        volume_id: &str,
        retry_interval: Duration,
    ) -> Result<RemoteVolume, ApiError> {
        let deadline = Instant::now().checked_add(self.wait_timeout);
        loop {
            let volume = self.fetch_volume(zone, volume_id).await?;
            if volume.state == STATE_ERROR {
                return Err(ApiError::VolumeFailed {
                    volume_id: volume_id.to_owned(),
                });
            }
            if volume.is_stable() {
                return Ok(volume);
            }

            let next_poll = Instant::now().checked_add(retry_interval);
            if deadline.is_some_and(|deadline| next_poll.is_none_or(|next| next > deadline)) {
                return Err(ApiError::Timeout {
                    volume_id: volume_id.to_owned(),
                    state: volume.state,
                });
            }

            debug!(zone, volume_id, state = %volume.state, "volume not yet stable");
            sleep(retry_interval).await;
        }
    }
}
