use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write would leave two overlapping confirmed, validated, active
    /// reservations on the same resource. Carries the conflicting window so
    /// callers can explain the rejection.
    #[error("Resource {resource_id} is occupied by another reservation in [{start}, {stop})")]
    ResourceConflict {
        resource_id: Uuid,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    },

    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Schedule(#[from] tessera_sched::error::ScheduleError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
