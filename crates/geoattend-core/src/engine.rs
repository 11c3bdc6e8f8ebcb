//! The attendance geofence pipeline.
//!
//! One cycle is a straight line: gate, probe, evaluate, classify, persist,
//! and maybe notify. There is no concurrency inside a cycle and no retry; a
//! failed cycle leaves stored state alone and waits for the next tick.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = GeofenceEngine::new(store, OfficeGeofence::DEFAULT, gate, probe, dispatcher);
//! let outcome = engine.run_cycle(Local::now().date_naive()).await;
//! ```

use chrono::{NaiveDate, Utc};

use crate::error::StoreError;
use crate::events::CycleOutcome;
use crate::geofence::OfficeGeofence;
use crate::location::{LocationProbe, LocationProvider};
use crate::notify::{NotificationDispatcher, Notifier, ReminderKind};
use crate::permission::{GateDecision, PermissionGate, PermissionSource};
use crate::store::{KeyValueStore, TransitionState};
use crate::transition::{self, GeofenceState};

pub struct GeofenceEngine<S, P, L, N> {
    store: S,
    geofence: OfficeGeofence,
    gate: PermissionGate<P>,
    probe: LocationProbe<L>,
    dispatcher: NotificationDispatcher<N>,
}

impl<S, P, L, N> GeofenceEngine<S, P, L, N>
where
    S: KeyValueStore,
    P: PermissionSource,
    L: LocationProvider,
    N: Notifier,
{
    pub fn new(
        store: S,
        geofence: OfficeGeofence,
        gate: PermissionGate<P>,
        probe: LocationProbe<L>,
        dispatcher: NotificationDispatcher<N>,
    ) -> Self {
        Self {
            store,
            geofence,
            gate,
            probe,
            dispatcher,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn geofence(&self) -> &OfficeGeofence {
        &self.geofence
    }

    pub fn gate(&self) -> &PermissionGate<P> {
        &self.gate
    }

    /// Run one full cycle for `today`.
    pub async fn run_cycle(&self, today: NaiveDate) -> CycleOutcome {
        let attendance = match self.gate.check(&self.store, today).await {
            GateDecision::Allowed(attendance) => attendance,
            GateDecision::Denied(reason) => {
                tracing::debug!(?reason, "cycle skipped");
                return CycleOutcome::Skipped {
                    reason,
                    at: Utc::now(),
                };
            }
        };

        let fix = match self.probe.acquire().await {
            Ok(fix) => fix,
            Err(e) => {
                tracing::info!(error = %e, "no location fix, keeping stored state");
                return CycleOutcome::LocationFailed {
                    error: e.to_string(),
                    at: Utc::now(),
                };
            }
        };

        let evaluation = self.geofence.evaluate(&fix);

        // Read as late as possible so an overlapping cycle's write is seen.
        let previous = match TransitionState::load(&self.store) {
            Ok(state) => state.last_inside,
            Err(StoreError::Corrupt { message, .. }) => {
                tracing::warn!(%message, "stored geofence state unreadable, reseeding");
                None
            }
            Err(e) => return store_failed(e),
        };

        let transition = transition::classify(previous, evaluation.inside, &attendance);
        if let Err(e) = TransitionState::store_inside(&self.store, transition.persist_inside) {
            // Without the write a later cycle would see the same edge again.
            return store_failed(e);
        }

        let notification = match ReminderKind::for_classification(transition.classification) {
            Some(kind) => Some(self.dispatcher.dispatch(kind).await),
            None => None,
        };

        tracing::info!(
            classification = ?transition.classification,
            inside = evaluation.inside,
            distance_m = evaluation.distance_m,
            "geofence evaluated"
        );

        CycleOutcome::Evaluated {
            previous: GeofenceState::from(previous),
            inside: evaluation.inside,
            distance_m: evaluation.distance_m,
            classification: transition.classification,
            notification,
            at: Utc::now(),
        }
    }

    /// Current stored geofence memory.
    pub fn transition_state(&self) -> Result<TransitionState, StoreError> {
        TransitionState::load(&self.store)
    }

    /// Forget the geofence memory, e.g. on logout, so the next session
    /// reseeds instead of resuming another user's state.
    pub fn reset(&self) -> Result<(), StoreError> {
        tracing::info!("clearing geofence state");
        TransitionState::clear(&self.store)
    }
}

fn store_failed(e: StoreError) -> CycleOutcome {
    tracing::warn!(error = %e, "geofence state store failed");
    CycleOutcome::StoreFailed {
        error: e.to_string(),
        at: Utc::now(),
    }
}
