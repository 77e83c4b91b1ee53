//! BDD scenarios for the volume lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{VolumeContext, volume_context};

#[scenario(
    path = "tests/features/volume.feature",
    name = "Grow a block volume, refuse a shrink, and delete it once detached"
)]
fn scenario_full_lifecycle(volume_context: VolumeContext) {
    drop(volume_context);
}

#[scenario(
    path = "tests/features/volume.feature",
    name = "Refuse to resize a local volume"
)]
fn scenario_local_resize_refused(volume_context: VolumeContext) {
    drop(volume_context);
}

#[scenario(
    path = "tests/features/volume.feature",
    name = "Give up deleting a volume that stays attached"
)]
fn scenario_delete_timeout(volume_context: VolumeContext) {
    drop(volume_context);
}

#[scenario(
    path = "tests/features/volume.feature",
    name = "Report a volume deleted out of band as absent"
)]
fn scenario_absent_after_out_of_band_delete(volume_context: VolumeContext) {
    drop(volume_context);
}
