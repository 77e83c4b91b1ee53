//! Shared fixtures for volume lifecycle scenarios.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rstest::fixture;
use scw_volume::test_support::FakeInstanceApi;
use scw_volume::{Placement, VolumeError, VolumeReconciler, VolumeState};

use crate::test_constants::{TEST_PROJECT_ID, TEST_ZONE};

const RETRY_INTERVAL: Duration = Duration::from_millis(1);
const DELETE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub struct Observed {
    pub state: Option<VolumeState>,
    pub error: Option<VolumeError>,
    pub delete_timeout: Option<Duration>,
}

/// Scenario state. The fake API and the observations are shared, so steps
/// can work through a shared reference.
#[derive(Clone, Debug)]
pub struct VolumeContext {
    pub api: FakeInstanceApi,
    observed: Arc<Mutex<Observed>>,
}

impl VolumeContext {
    pub fn observed(&self) -> MutexGuard<'_, Observed> {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reconciler(&self) -> VolumeReconciler<FakeInstanceApi> {
        let delete_timeout = self.observed().delete_timeout.unwrap_or(DELETE_TIMEOUT);
        VolumeReconciler::new(
            self.api.clone(),
            Placement::new(TEST_ZONE, Some(String::from(TEST_PROJECT_ID))),
        )
        .with_retry_interval(RETRY_INTERVAL)
        .with_delete_timeout(delete_timeout)
    }

    pub fn current_state(&self) -> Option<VolumeState> {
        self.observed().state.clone()
    }

    pub fn record(&self, result: Result<Option<VolumeState>, VolumeError>) {
        let mut observed = self.observed();
        match result {
            Ok(state) => {
                if state.is_some() {
                    observed.state = state;
                }
                observed.error = None;
            }
            Err(err) => observed.error = Some(err),
        }
    }
}

#[fixture]
pub fn volume_context() -> VolumeContext {
    VolumeContext {
        api: FakeInstanceApi::new(),
        observed: Arc::new(Mutex::new(Observed::default())),
    }
}
