//! Reconciliation: make a scheduler's persisted reservations match its
//! rule's occurrence set.
//!
//! Planning is pure and positional. Occurrences and existing children are
//! both sorted by start, then zipped: paired records are rewritten in
//! place (keeping their identity and history), surplus occurrences become
//! inserts, surplus records become deletes. The plan is applied atomically
//! by the store, and only afterwards are approvers notified of any
//! reservations that came out in the requested state.

use chrono_tz::Tz;
use uuid::Uuid;

use tessera_core::constants::MAX_RECURRENCE_ITERATIONS;
use tessera_core::types::ReservationState;
use tessera_sched::overlap::Window;
use tessera_sched::recurrence::occurrences_bounded;
use tessera_sched::interval;
use tessera_store::model::{NewReservation, Reservation, ReservationUpdate};
use tessera_store::store::{ReconcilePlan, ReservationStore};

use crate::error::ServiceResult;
use crate::intent::SchedulerIntent;
use crate::notify::NotificationDispatcher;

/// What one reconciliation run did to the scheduler's children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub updated: Vec<Uuid>,
    pub created: Vec<Uuid>,
    pub deleted_ids: Vec<Uuid>,
}

/// ## Summary
/// Builds the positional diff between the materialized occurrence windows
/// and the scheduler's existing children. Both inputs must be sorted by
/// ascending start.
#[must_use]
pub fn plan_reservations(
    intent: &SchedulerIntent,
    windows: &[Window],
    existing: &[Reservation],
) -> ReconcilePlan {
    let state = intent.reservation_state();

    let updates = existing
        .iter()
        .zip(windows.iter())
        .map(|(reservation, window)| ReservationUpdate {
            id: reservation.id,
            start: window.start(),
            stop: window.stop(),
            state,
            validate: intent.rule.validate,
        })
        .collect();

    let creates = windows
        .iter()
        .skip(existing.len())
        .map(|window| NewReservation {
            resource_id: intent.resource_id,
            name: intent.name.clone(),
            description: intent.description.clone(),
            start: window.start(),
            stop: window.stop(),
            state,
            validate: intent.rule.validate,
            scheduler_id: Some(intent.scheduler_id),
        })
        .collect();

    let delete_ids = existing
        .iter()
        .skip(windows.len())
        .map(|reservation| reservation.id)
        .collect();

    ReconcilePlan {
        updates,
        creates,
        delete_ids,
    }
}

/// ## Summary
/// Reconciles a scheduler's reservations against its rule using the
/// default recurrence iteration ceiling. See [`reconcile_bounded`].
///
/// ## Errors
/// Same as [`reconcile_bounded`].
pub async fn reconcile<S, D>(
    store: &S,
    dispatcher: &D,
    intent: &SchedulerIntent,
    tz: Tz,
) -> ServiceResult<ReconcileOutcome>
where
    S: ReservationStore + ?Sized,
    D: NotificationDispatcher + ?Sized,
{
    reconcile_bounded(store, dispatcher, intent, tz, MAX_RECURRENCE_ITERATIONS).await
}

/// ## Summary
/// Reconciles a scheduler's reservations against its rule: validates the
/// rule, generates and materializes its occurrences in the given timezone,
/// diffs them against the existing children and applies the diff
/// atomically. Reservations created in the requested state are handed to
/// the dispatcher after the commit; dispatch failures are logged and never
/// affect the result.
///
/// `limit` caps occurrence generation; embedders pass
/// `SchedulingConfig::recurrence_iteration_limit` here to honor the
/// configured ceiling.
///
/// ## Errors
/// Returns `ScheduleError` variants for an invalid rule, a runaway
/// recurrence or an occurrence that cannot form a window, and
/// `StoreError::ResourceConflict` when the final state would put two
/// blocking reservations on one resource. Store errors imply a full
/// rollback: the children are exactly as they were before the call.
pub async fn reconcile_bounded<S, D>(
    store: &S,
    dispatcher: &D,
    intent: &SchedulerIntent,
    tz: Tz,
    limit: usize,
) -> ServiceResult<ReconcileOutcome>
where
    S: ReservationStore + ?Sized,
    D: NotificationDispatcher + ?Sized,
{
    let rule = intent.rule.validate_and_normalize()?;
    let dates = occurrences_bounded(&rule, limit)?;
    let span = rule.day_span()?;

    let mut windows = Vec::with_capacity(dates.len());
    for date in dates {
        windows.push(interval::materialize(date, span, tz)?);
    }

    let existing = store.children_of(intent.scheduler_id).await?;

    let normalized = SchedulerIntent {
        rule,
        ..intent.clone()
    };
    let plan = plan_reservations(&normalized, &windows, &existing);

    tracing::debug!(
        scheduler_id = %intent.scheduler_id,
        updates = plan.updates.len(),
        creates = plan.creates.len(),
        deletes = plan.delete_ids.len(),
        "Applying reconciliation plan"
    );

    let outcome = store.apply_plan(intent.scheduler_id, plan).await?;

    let requested: Vec<Reservation> = outcome
        .created
        .iter()
        .filter(|reservation| reservation.state == ReservationState::Requested)
        .cloned()
        .collect();
    if !requested.is_empty() {
        if let Err(error) = dispatcher.reservations_requested(&requested).await {
            tracing::warn!(
                scheduler_id = %intent.scheduler_id,
                %error,
                "Notification dispatch failed after commit"
            );
        }
    }

    Ok(ReconcileOutcome {
        updated: outcome.updated,
        created: outcome
            .created
            .iter()
            .map(|reservation| reservation.id)
            .collect(),
        deleted_ids: outcome.deleted_ids,
    })
}
