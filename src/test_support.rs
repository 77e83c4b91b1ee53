//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::api::{
    ApiError, ApiFuture, CreateVolumeRequest, InstanceApi, RemoteVolume, STATE_AVAILABLE,
    UpdateVolumeRequest,
};
use crate::volume::gb_to_bytes;

/// Project recorded when a create request names none.
pub const DEFAULT_PROJECT: &str = "default-project";
/// Organization recorded on every volume.
pub const DEFAULT_ORGANIZATION: &str = "default-organization";
/// Size in gigabytes given to seeded volumes whose seed is unknown.
pub const DEFAULT_SEED_SIZE_GB: u64 = 20;

/// Records a single call made through [`FakeInstanceApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// `CreateVolume`.
    Create(CreateVolumeRequest),
    /// `GetVolume`.
    Get {
        /// Zone passed by the caller.
        zone: String,
        /// Volume id passed by the caller.
        volume_id: String,
    },
    /// `UpdateVolume`.
    Update(UpdateVolumeRequest),
    /// `DeleteVolume`.
    Delete {
        /// Zone passed by the caller.
        zone: String,
        /// Volume id passed by the caller.
        volume_id: String,
    },
    /// `WaitForVolume`.
    Wait {
        /// Zone passed by the caller.
        zone: String,
        /// Volume id passed by the caller.
        volume_id: String,
    },
}

/// Operations that can be scripted to fail.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum FailOn {
    /// `CreateVolume` returns a provider error.
    Create,
    /// `GetVolume` returns a provider error.
    Get,
    /// `UpdateVolume` carrying a name returns a provider error.
    Rename,
    /// `UpdateVolume` carrying a size returns a provider error.
    Resize,
    /// `WaitForVolume` times out.
    Wait,
    /// `DeleteVolume` returns a provider error.
    Delete,
}

#[derive(Clone, Debug)]
struct StoredVolume {
    volume: RemoteVolume,
    detach_after_reads: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    volumes: BTreeMap<(String, String), StoredVolume>,
    calls: Vec<ApiCall>,
    failures: BTreeSet<FailOn>,
}

/// In-memory Instance API that records every call.
///
/// Volumes created through it settle immediately unless resized, in which
/// case they stay `resizing` until the next wait. Attachment can be scripted
/// to clear after a number of reads to exercise the delete retry loop.
#[derive(Clone, Debug, Default)]
pub struct FakeInstanceApi {
    state: Arc<Mutex<State>>,
}

impl FakeInstanceApi {
    /// Creates an empty API.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a volume as if it had been created out of band.
    pub fn insert_volume(&self, volume: RemoteVolume) {
        self.lock().volumes.insert(
            (volume.zone.clone(), volume.id.clone()),
            StoredVolume {
                volume,
                detach_after_reads: None,
            },
        );
    }

    /// Removes a volume as if it had been deleted out of band.
    pub fn remove_volume(&self, zone: &str, volume_id: &str) {
        self.lock()
            .volumes
            .remove(&(zone.to_owned(), volume_id.to_owned()));
    }

    /// Attaches a volume to `server_id`. When `detach_after_reads` is set,
    /// the volume detaches once that many reads have observed it attached.
    pub fn attach(
        &self,
        zone: &str,
        volume_id: &str,
        server_id: &str,
        detach_after_reads: Option<u32>,
    ) {
        if let Some(stored) = self
            .lock()
            .volumes
            .get_mut(&(zone.to_owned(), volume_id.to_owned()))
        {
            stored.volume.server_id = Some(server_id.to_owned());
            stored.detach_after_reads = detach_after_reads;
        }
    }

    /// Makes every later call of the given kind fail.
    pub fn fail(&self, operation: FailOn) {
        self.lock().failures.insert(operation);
    }

    /// Returns the stored copy of a volume.
    #[must_use]
    pub fn volume(&self, zone: &str, volume_id: &str) -> Option<RemoteVolume> {
        self.lock()
            .volumes
            .get(&(zone.to_owned(), volume_id.to_owned()))
            .map(|stored| stored.volume.clone())
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Counts recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn simulated(operation: FailOn) -> ApiError {
        ApiError::Provider {
            status: Some(400),
            message: format!("simulated {operation:?} failure"),
        }
    }

    fn not_found(zone: &str, volume_id: &str) -> ApiError {
        ApiError::NotFound {
            zone: zone.to_owned(),
            volume_id: volume_id.to_owned(),
        }
    }

    fn do_create(&self, request: &CreateVolumeRequest) -> Result<RemoteVolume, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Create(request.clone()));
        if state.failures.contains(&FailOn::Create) {
            return Err(Self::simulated(FailOn::Create));
        }

        let base_size = request.base_volume.as_ref().and_then(|base| {
            state
                .volumes
                .get(&(request.zone.clone(), base.clone()))
                .map(|stored| stored.volume.size_bytes)
        });
        let size_bytes = match (request.size_bytes, base_size) {
            (Some(size), _) | (None, Some(size)) => size,
            (None, None) => gb_to_bytes(DEFAULT_SEED_SIZE_GB).map_err(|err| ApiError::Provider {
                status: Some(400),
                message: err.to_string(),
            })?,
        };

        let volume = RemoteVolume {
            id: Uuid::new_v4().to_string(),
            name: request.name.clone(),
            volume_type: request.volume_type,
            size_bytes,
            project: request
                .project_id
                .clone()
                .unwrap_or_else(|| DEFAULT_PROJECT.to_owned()),
            organization: DEFAULT_ORGANIZATION.to_owned(),
            zone: request.zone.clone(),
            state: STATE_AVAILABLE.to_owned(),
            server_id: None,
        };
        state.volumes.insert(
            (volume.zone.clone(), volume.id.clone()),
            StoredVolume {
                volume: volume.clone(),
                detach_after_reads: None,
            },
        );
        Ok(volume)
    }

    fn do_get(&self, zone: &str, volume_id: &str) -> Result<RemoteVolume, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Get {
            zone: zone.to_owned(),
            volume_id: volume_id.to_owned(),
        });
        if state.failures.contains(&FailOn::Get) {
            return Err(Self::simulated(FailOn::Get));
        }
        let stored = state
            .volumes
            .get_mut(&(zone.to_owned(), volume_id.to_owned()))
            .ok_or_else(|| Self::not_found(zone, volume_id))?;

        let observed = stored.volume.clone();
        if let Some(remaining) = stored.detach_after_reads {
            if remaining <= 1 {
                stored.volume.server_id = None;
                stored.detach_after_reads = None;
            } else {
                stored.detach_after_reads = Some(remaining - 1);
            }
        }
        Ok(observed)
    }

    fn do_update(&self, request: &UpdateVolumeRequest) -> Result<RemoteVolume, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Update(request.clone()));
        if request.name.is_some() && state.failures.contains(&FailOn::Rename) {
            return Err(Self::simulated(FailOn::Rename));
        }
        if request.size_bytes.is_some() && state.failures.contains(&FailOn::Resize) {
            return Err(Self::simulated(FailOn::Resize));
        }
        let stored = state
            .volumes
            .get_mut(&(request.zone.clone(), request.volume_id.clone()))
            .ok_or_else(|| Self::not_found(&request.zone, &request.volume_id))?;

        if let Some(name) = &request.name {
            stored.volume.name.clone_from(name);
        }
        if let Some(size_bytes) = request.size_bytes {
            stored.volume.size_bytes = size_bytes;
            stored.volume.state = String::from("resizing");
        }
        Ok(stored.volume.clone())
    }

    fn do_delete(&self, zone: &str, volume_id: &str) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Delete {
            zone: zone.to_owned(),
            volume_id: volume_id.to_owned(),
        });
        if state.failures.contains(&FailOn::Delete) {
            return Err(Self::simulated(FailOn::Delete));
        }
        state
            .volumes
            .remove(&(zone.to_owned(), volume_id.to_owned()))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(zone, volume_id))
    }

    fn do_wait(&self, zone: &str, volume_id: &str) -> Result<RemoteVolume, ApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::Wait {
            zone: zone.to_owned(),
            volume_id: volume_id.to_owned(),
        });
        let fail = state.failures.contains(&FailOn::Wait);
        let stored = state
            .volumes
            .get_mut(&(zone.to_owned(), volume_id.to_owned()))
            .ok_or_else(|| Self::not_found(zone, volume_id))?;
        if fail {
            return Err(ApiError::Timeout {
                volume_id: volume_id.to_owned(),
                state: stored.volume.state.clone(),
            });
        }
        STATE_AVAILABLE.clone_into(&mut stored.volume.state);
        Ok(stored.volume.clone())
    }
}

impl InstanceApi for FakeInstanceApi {
    fn create_volume<'a>(&'a self, request: &'a CreateVolumeRequest) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.do_create(request) })
    }

    fn get_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.do_get(zone, volume_id) })
    }

    fn update_volume<'a>(&'a self, request: &'a UpdateVolumeRequest) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.do_update(request) })
    }

    fn delete_volume<'a>(&'a self, zone: &'a str, volume_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.do_delete(zone, volume_id) })
    }

    fn wait_for_volume<'a>(
        &'a self,
        zone: &'a str,
        volume_id: &'a str,
        _retry_interval: Duration,
    ) -> ApiFuture<'a, RemoteVolume> {
        Box::pin(async move { self.do_wait(zone, volume_id) })
    }
}
