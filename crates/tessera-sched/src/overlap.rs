//! Half-open time windows and the overlap predicate.
//!
//! Two half-open intervals `[s1, e1)` and `[s2, e2)` overlap iff
//! `s1 < e2 && s2 < e1`. The "does not overlap" predicate is the
//! De Morgan dual: `s1 >= e2 || s2 >= e1`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};

/// A non-empty half-open UTC interval `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
}

impl Window {
    /// ## Summary
    /// Builds a window from its bounds.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidInterval` when `stop <= start`, so a
    /// zero-length or inverted window can never be constructed.
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> ScheduleResult<Self> {
        if stop <= start {
            return Err(ScheduleError::InvalidInterval { start, stop });
        }

        Ok(Self { start, stop })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn stop(&self) -> DateTime<Utc> {
        self.stop
    }

    /// ## Summary
    /// Returns true when this window and `other` share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.stop && other.start < self.stop
    }

    /// ## Summary
    /// Returns true when this window and `other` share no instant.
    #[must_use]
    pub fn disjoint(&self, other: &Self) -> bool {
        self.start >= other.stop || other.start >= self.stop
    }

    /// ## Summary
    /// Extends the window forward by `margin`. Used by "available now"
    /// queries so a resource freeing up within the margin still reads busy.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidInterval` when a negative margin
    /// collapses or inverts the window.
    pub fn with_margin(&self, margin: TimeDelta) -> ScheduleResult<Self> {
        Self::new(self.start, self.stop + margin)
    }

    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.stop - self.start
    }

    /// ## Summary
    /// Returns the window length as float hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        let seconds = self.duration().num_seconds();

        // i64 seconds of any realistic reservation fit in f64's mantissa
        #[expect(clippy::cast_precision_loss)]
        let hours = seconds as f64 / 3600.0;

        hours
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}
