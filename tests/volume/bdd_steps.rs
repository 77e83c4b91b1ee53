//! BDD step definitions for the volume lifecycle.

use std::time::Duration;

use rstest_bdd_macros::{given, then, when};
use scw_volume::test_support::ApiCall;
use scw_volume::{Action, VolumeConfig, VolumeError, VolumeSource, VolumeState, VolumeType};
use tokio::runtime::Runtime;

use super::test_helpers::VolumeContext;
use crate::test_constants::TEST_ZONE;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))
}

fn current(volume_context: &VolumeContext) -> Result<VolumeState, StepError> {
    volume_context
        .current_state()
        .ok_or_else(|| StepError::Assertion(String::from("no volume has been created")))
}

fn parse_type(volume_type: &str) -> Result<VolumeType, StepError> {
    volume_type
        .parse()
        .map_err(|err| StepError::Assertion(format!("{err}")))
}

#[given("a volume reconciler")]
fn volume_reconciler(volume_context: &VolumeContext) {
    volume_context.api.clear_calls();
}

#[given("deletions give up after \"{millis}\" milliseconds")]
fn deletions_give_up(volume_context: &VolumeContext, millis: u64) {
    volume_context.observed().delete_timeout = Some(Duration::from_millis(millis));
}

#[when("I create a \"{volume_type}\" volume of \"{size}\" GB")]
fn create_volume(
    volume_context: &VolumeContext,
    volume_type: String,
    size: u64,
) -> Result<(), StepError> {
    let config = VolumeConfig::builder(parse_type(&volume_type)?)
        .name(Some(String::from("scenario-volume")))
        .size_in_gb(Some(size))
        .build()
        .map_err(|err| StepError::Assertion(err.to_string()))?;
    let reconciler = volume_context.reconciler();
    let result = runtime()?.block_on(async { reconciler.create(&config).await });
    let state = result.map_err(|err| StepError::Assertion(format!("create failed: {err}")))?;
    volume_context.record(Ok(Some(state)));
    Ok(())
}

#[when("I resize the volume to \"{size}\" GB")]
fn resize_volume(volume_context: &VolumeContext, size: u64) -> Result<(), StepError> {
    let prior = current(volume_context)?;
    let mut desired = VolumeConfig::from_state(&prior);
    desired.source = VolumeSource::Size(size);

    volume_context.api.clear_calls();
    let reconciler = volume_context.reconciler();
    let result = runtime()?.block_on(async { reconciler.update(&prior, &desired).await });
    volume_context.record(result.map(Some));
    Ok(())
}

#[when("the volume is attached for \"{reads}\" more reads")]
fn attached_for(volume_context: &VolumeContext, reads: u32) -> Result<(), StepError> {
    let state = current(volume_context)?;
    volume_context
        .api
        .attach(TEST_ZONE, &state.id.id, "srv-scenario", Some(reads));
    Ok(())
}

#[when("the volume stays attached")]
fn stays_attached(volume_context: &VolumeContext) -> Result<(), StepError> {
    let state = current(volume_context)?;
    volume_context
        .api
        .attach(TEST_ZONE, &state.id.id, "srv-scenario", None);
    Ok(())
}

#[when("the volume is deleted out of band")]
fn deleted_out_of_band(volume_context: &VolumeContext) -> Result<(), StepError> {
    let state = current(volume_context)?;
    volume_context.api.remove_volume(TEST_ZONE, &state.id.id);
    Ok(())
}

#[when("I delete the volume")]
fn delete_volume(volume_context: &VolumeContext) -> Result<(), StepError> {
    let state = current(volume_context)?;
    volume_context.api.clear_calls();
    let reconciler = volume_context.reconciler();
    let result = runtime()?.block_on(async { reconciler.delete(&state.id).await });
    volume_context.record(result.map(|()| None));
    Ok(())
}

#[then("the volume reads back as \"{volume_type}\" with \"{size}\" GB")]
fn reads_back(
    volume_context: &VolumeContext,
    volume_type: String,
    size: u64,
) -> Result<(), StepError> {
    let expected_type = parse_type(&volume_type)?;
    let id = current(volume_context)?.id;
    let reconciler = volume_context.reconciler();
    let read = runtime()?
        .block_on(async { reconciler.read(&id).await })
        .map_err(|err| StepError::Assertion(format!("read failed: {err}")))?;
    let state = read.ok_or_else(|| StepError::Assertion(format!("volume {id} is missing")))?;

    if state.volume_type == expected_type && state.size_in_gb == size && state.zone == TEST_ZONE {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {volume_type} with {size} GB in {TEST_ZONE}, got {} with {} GB in {}",
            state.volume_type, state.size_in_gb, state.zone
        )))
    }
}

#[then("the provider saw \"{waits}\" waits and \"{resizes}\" resize")]
fn provider_saw(volume_context: &VolumeContext, waits: usize, resizes: usize) -> Result<(), StepError> {
    let api = &volume_context.api;
    let seen_waits = api.count_calls(|call| matches!(call, ApiCall::Wait { .. }));
    let seen_resizes = api.count_calls(
        |call| matches!(call, ApiCall::Update(request) if request.size_bytes.is_some()),
    );
    if seen_waits == waits && seen_resizes == resizes {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {waits} waits and {resizes} resizes, got {seen_waits} and {seen_resizes}"
        )))
    }
}

#[then("the update is rejected without remote calls")]
fn update_rejected(volume_context: &VolumeContext) -> Result<(), StepError> {
    let calls = volume_context.api.calls();
    if !calls.is_empty() {
        return Err(StepError::Assertion(format!(
            "expected no remote calls, got {calls:?}"
        )));
    }
    match volume_context.observed().error {
        Some(VolumeError::Validation(_)) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected a validation error, got {other:?}"
        ))),
    }
}

#[then("the delete succeeds")]
fn delete_succeeds(volume_context: &VolumeContext) -> Result<(), StepError> {
    match volume_context.observed().error {
        None => Ok(()),
        Some(ref err) => Err(StepError::Assertion(format!("delete failed: {err}"))),
    }
}

#[then("the delete times out")]
fn delete_times_out(volume_context: &VolumeContext) -> Result<(), StepError> {
    match volume_context.observed().error {
        Some(VolumeError::Timeout {
            action: Action::Delete,
            ..
        }) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected a delete timeout, got {other:?}"
        ))),
    }
}

#[then("the volume is gone")]
fn volume_gone(volume_context: &VolumeContext) -> Result<(), StepError> {
    let state = current(volume_context)?;
    if volume_context.api.volume(TEST_ZONE, &state.id.id).is_none() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "volume {} still exists",
            state.id
        )))
    }
}

#[then("reading the volume reports it absent")]
fn reads_absent(volume_context: &VolumeContext) -> Result<(), StepError> {
    let id = current(volume_context)?.id;
    let reconciler = volume_context.reconciler();
    let read = runtime()?
        .block_on(async { reconciler.read(&id).await })
        .map_err(|err| StepError::Assertion(format!("read failed: {err}")))?;
    match read {
        None => Ok(()),
        Some(state) => Err(StepError::Assertion(format!(
            "expected no volume, got {state:?}"
        ))),
    }
}
