//! Interval materialization: an occurrence date plus a wall-clock span and
//! an explicit caller timezone become a concrete UTC window.
//!
//! The local→UTC offset is resolved per bound, at each local instant, so a
//! window that straddles a daylight-saving transition keeps its wall-clock
//! meaning instead of a fixed offset.

use chrono::{
    DateTime, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::Tz;

use tessera_core::constants::FULL_DAY_HOURS;

use crate::error::{ScheduleError, ScheduleResult};
use crate::overlap::Window;

/// Wall-clock bounds of one occurrence, float hours of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySpan {
    start_hours: f64,
    stop_hours: f64,
}

impl DaySpan {
    /// ## Summary
    /// Builds a span from wall-clock bounds.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidRule` unless
    /// `0 <= start < stop <= 24`.
    pub fn new(start_hours: f64, stop_hours: f64) -> ScheduleResult<Self> {
        if !(0.0..FULL_DAY_HOURS).contains(&start_hours)
            || stop_hours <= start_hours
            || stop_hours > FULL_DAY_HOURS
        {
            return Err(ScheduleError::InvalidRule(format!(
                "day span [{start_hours}, {stop_hours}) is not a valid wall-clock range"
            )));
        }

        Ok(Self {
            start_hours,
            stop_hours,
        })
    }

    /// ## Summary
    /// The entire local day, `[0, 24)`.
    #[must_use]
    pub const fn full_day() -> Self {
        Self {
            start_hours: 0.0,
            stop_hours: FULL_DAY_HOURS,
        }
    }

    #[must_use]
    pub const fn start_hours(&self) -> f64 {
        self.start_hours
    }

    #[must_use]
    pub const fn stop_hours(&self) -> f64 {
        self.stop_hours
    }
}

/// ## Summary
/// Binds an occurrence date and a wall-clock span into a concrete UTC
/// window, resolving the timezone offset at each bound's local instant.
///
/// ## Errors
/// Returns `ScheduleError::InvalidInterval` if the converted bounds
/// collapse, which cannot happen for a valid `DaySpan`.
pub fn materialize(date: NaiveDate, span: DaySpan, tz: Tz) -> ScheduleResult<Window> {
    let midnight = date.and_time(NaiveTime::MIN);

    let start_local = midnight + hours_delta(span.start_hours());
    let stop_local = midnight + hours_delta(span.stop_hours());

    let start = local_to_utc(start_local, tz);
    let stop = local_to_utc(stop_local, tz);

    tracing::trace!(%date, %tz, %start, %stop, "Materialized occurrence");

    Window::new(start, stop)
}

/// ## Summary
/// Splits a UTC instant into its local date and float hour of day, the
/// inverse of [`materialize`] for one bound.
#[must_use]
pub fn split_instant(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, f64) {
    let local = instant.with_timezone(&tz).naive_local();
    let date = local.date();
    let since_midnight = local - date.and_time(NaiveTime::MIN);

    #[expect(clippy::cast_precision_loss)]
    let hours = since_midnight.num_seconds() as f64 / 3600.0;

    (date, hours)
}

#[expect(clippy::cast_possible_truncation)]
fn hours_delta(hours: f64) -> TimeDelta {
    TimeDelta::seconds((hours * 3600.0).round() as i64)
}

fn local_to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        MappedLocalTime::Single(dt) => dt.with_timezone(&Utc),
        // Fall-back transition: the earlier of the two readings wins
        MappedLocalTime::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        MappedLocalTime::None => {
            // Spring-forward gap: the wall-clock time never happens, so
            // resolve against the offset in force at that instant
            let offset = tz.offset_from_utc_datetime(&local).fix();
            Utc.from_utc_datetime(&(local - offset))
        }
    }
}
