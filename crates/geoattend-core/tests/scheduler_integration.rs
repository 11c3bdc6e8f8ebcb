//! Completion-signal guarantees of the scheduler adapter.
//!
//! Every invocation, whatever its trigger and however the cycle ends, must
//! produce exactly one `finish` call for its task id.

mod common;

use std::time::Duration;

use common::{at_office, today, Harness, RecordingFacility};
use geoattend_core::{
    BackgroundTaskOptions, Classification, CycleOutcome, Invocation, LocationError,
    PermissionStatus, PlatformOs, PlatformProfile, Registration, SchedulerAdapter,
    TransitionState, TriggerSource,
};

fn finished(facility: &RecordingFacility) -> Vec<String> {
    facility.finished.borrow().clone()
}

#[test]
fn register_passes_background_options() {
    let h = Harness::new();
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    assert_eq!(adapter.register().unwrap(), Registration::Registered);

    let configured = facility.configured.borrow();
    assert_eq!(configured.len(), 1);
    assert_eq!(configured[0].minimum_interval.as_secs(), 15 * 60);
    assert!(!configured[0].stop_on_terminate);
    assert!(configured[0].start_on_boot);
    assert!(configured[0].enable_headless);
}

#[test]
fn unsupported_platform_is_not_registered() {
    let mut h = Harness::new();
    h.platform = PlatformProfile::for_os(PlatformOs::Ios, 17);
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    assert_eq!(adapter.register().unwrap(), Registration::Unsupported);
    assert!(facility.configured.borrow().is_empty());
}

#[tokio::test]
async fn successful_cycle_signals_completion_once() {
    let h = Harness::new();
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());
    h.location.push(Ok(at_office()));

    let report = adapter
        .on_invocation(&Invocation::new("tick-1", TriggerSource::Periodic), today())
        .await;

    assert_eq!(report.task_id, "tick-1");
    assert_eq!(report.outcome.classification(), Some(Classification::Seed));
    assert_eq!(finished(&facility), vec!["tick-1".to_string()]);
}

#[tokio::test]
async fn every_exit_path_signals_completion() {
    let h = Harness::new();
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    // Permission denied.
    h.grants.location.set(PermissionStatus::Denied);
    let denied = adapter
        .on_invocation(&Invocation::new("denied", TriggerSource::Boot), today())
        .await;
    assert!(matches!(denied.outcome, CycleOutcome::Skipped { .. }));
    h.grants.location.set(PermissionStatus::Granted);

    // Location failure.
    h.location.push(Err(LocationError::Unavailable("gps off".into())));
    let failed = adapter
        .on_invocation(&Invocation::new("no-fix", TriggerSource::Periodic), today())
        .await;
    assert!(matches!(failed.outcome, CycleOutcome::LocationFailed { .. }));

    // Dispatcher failure on a real transition.
    TransitionState::store_inside(&h.store, false).unwrap();
    h.notifier.fail_display.set(true);
    h.location.push(Ok(at_office()));
    let dispatch_failed = adapter.on_invocation(&Invocation::headless(), today()).await;
    assert_eq!(
        dispatch_failed.outcome.classification(),
        Some(Classification::Enter)
    );
    assert!(!dispatch_failed.outcome.notified());

    assert_eq!(
        finished(&facility),
        vec![
            "denied".to_string(),
            "no-fix".to_string(),
            dispatch_failed.task_id.clone()
        ]
    );
}

#[tokio::test]
async fn unsupported_platform_invocation_still_signals() {
    let mut h = Harness::new();
    h.platform = PlatformProfile::for_os(PlatformOs::Ios, 17);
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    let report = adapter
        .on_invocation(&Invocation::new("ios-boot", TriggerSource::Boot), today())
        .await;

    assert!(matches!(report.outcome, CycleOutcome::Skipped { .. }));
    assert_eq!(finished(&facility), vec!["ios-boot".to_string()]);
}

#[test]
fn timeout_signals_completion() {
    let h = Harness::new();
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    adapter.on_timeout("slow-task");

    assert_eq!(finished(&facility), vec!["slow-task".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn timeout_during_running_cycle_signals_once() {
    let h = Harness::new();
    h.location.delay.set(Some(Duration::from_secs(10)));
    h.location.push(Ok(at_office()));
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());
    let invocation = Invocation::new("t1", TriggerSource::Periodic);

    let (report, ()) = tokio::join!(adapter.on_invocation(&invocation, today()), async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(adapter.is_in_flight("t1"));
        adapter.on_timeout("t1");
    });

    assert_eq!(finished(&facility), vec!["t1".to_string()]);
    assert!(!adapter.is_in_flight("t1"));
    // The cycle itself still ran to the end.
    assert_eq!(report.outcome.classification(), Some(Classification::Seed));
}

#[tokio::test]
async fn completed_cycle_is_no_longer_in_flight() {
    let h = Harness::new();
    h.location.push(Ok(at_office()));
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    adapter
        .on_invocation(&Invocation::new("t2", TriggerSource::Boot), today())
        .await;

    assert!(!adapter.is_in_flight("t2"));
    assert_eq!(finished(&facility), vec!["t2".to_string()]);
}

#[test]
fn stop_deregisters_and_clears_state() {
    let h = Harness::new();
    TransitionState::store_inside(&h.store, true).unwrap();
    let facility = RecordingFacility::default();
    let adapter = SchedulerAdapter::new(&facility, h.engine(), BackgroundTaskOptions::default());

    adapter.stop().unwrap();

    assert_eq!(facility.stopped.get(), 1);
    assert_eq!(TransitionState::load(&h.store).unwrap().last_inside, None);
}
