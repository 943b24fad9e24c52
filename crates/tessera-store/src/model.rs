//! Reservation records as the store persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::types::ReservationState;
use tessera_sched::overlap::Window;

/// A materialized occurrence persisted against a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub state: ReservationState,
    /// Archived reservations keep their row but never block anything.
    pub active: bool,
    /// Whether overlap checking is enforced for this record.
    pub validate: bool,
    /// Owning scheduler, when the reservation was materialized from a rule.
    pub scheduler_id: Option<Uuid>,
}

impl Reservation {
    /// ## Summary
    /// Returns true when this record participates in the non-overlap
    /// invariant: active, validated and confirmed.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.active && self.validate && self.state == ReservationState::Confirmed
    }

    /// ## Summary
    /// Returns true when the reservation shares at least one instant with
    /// the window.
    #[must_use]
    pub fn overlaps(&self, window: &Window) -> bool {
        self.start < window.stop() && window.start() < self.stop
    }

    /// ## Summary
    /// Returns the reservation length in float hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        let seconds = (self.stop - self.start).num_seconds().max(0);

        #[expect(clippy::cast_precision_loss)]
        let hours = seconds as f64 / 3600.0;

        hours
    }
}

/// Insert values for creating new reservations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub resource_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub state: ReservationState,
    pub validate: bool,
    pub scheduler_id: Option<Uuid>,
}

/// Rule-derived values rewritten onto an existing reservation in place,
/// preserving its identity and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub state: ReservationState,
    pub validate: bool,
}
