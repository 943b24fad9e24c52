use chrono::{DateTime, Utc};
use thiserror::Error;

/// Scheduling layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Recurrence overflow: iteration ceiling of {limit} exceeded")]
    RecurrenceOverflow { limit: usize },

    #[error("Invalid interval: start {start} is not before stop {stop}")]
    InvalidInterval {
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    },
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
