//! A scheduling intent: one recurrence rule bound to a resource, plus the
//! metadata its materialized reservations inherit. The rule is a plain
//! embedded value, never a shared base record.

use chrono_tz::Tz;
use uuid::Uuid;

use tessera_core::types::ReservationState;
use tessera_sched::error::ScheduleResult;
use tessera_sched::overlap::Window;
use tessera_sched::rule::RecurrenceRule;
use tessera_store::model::Reservation;

/// One recurrence rule bound to a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerIntent {
    pub scheduler_id: Uuid,
    pub resource_id: Uuid,
    /// Inherited by every reservation the intent materializes.
    pub name: Option<String>,
    pub description: Option<String>,
    pub rule: RecurrenceRule,
}

impl SchedulerIntent {
    /// ## Summary
    /// Builds an intent with a fresh scheduler id and no metadata.
    #[must_use]
    pub fn new(resource_id: Uuid, rule: RecurrenceRule) -> Self {
        Self {
            scheduler_id: Uuid::new_v4(),
            resource_id,
            name: None,
            description: None,
            rule,
        }
    }

    /// ## Summary
    /// The state newly materialized reservations start in.
    #[must_use]
    pub fn reservation_state(&self) -> ReservationState {
        if self.rule.confirm {
            ReservationState::Confirmed
        } else {
            ReservationState::Requested
        }
    }

    /// ## Summary
    /// Derives a non-repeating intent from an existing ad-hoc reservation,
    /// so it can be grown into a recurring one.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidRule` when the reservation does not
    /// fit within one local day in the given timezone.
    pub fn from_reservation(reservation: &Reservation, tz: Tz) -> ScheduleResult<Self> {
        let window = Window::new(reservation.start, reservation.stop)?;

        let mut rule = RecurrenceRule::from_window(&window, tz)?;
        rule.confirm = reservation.state == ReservationState::Confirmed;
        rule.validate = reservation.validate;

        Ok(Self {
            scheduler_id: Uuid::new_v4(),
            resource_id: reservation.resource_id,
            name: reservation.name.clone(),
            description: reservation.description.clone(),
            rule,
        })
    }
}
