//! Recurrence rule model and edit-time validation.
//!
//! A rule is a plain value: validation happens through
//! [`RecurrenceRule::validate_and_normalize`] before any generation, never
//! through reactive field callbacks, and never silently corrects bad input.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use tessera_core::constants::{
    FULL_DAY_HOURS, START_GRANULARITY_HOURS, STOP_GRANULARITY_HOURS,
};
use tessera_core::types::Weekday;

use crate::error::{ScheduleError, ScheduleResult};
use crate::interval::{DaySpan, split_instant};
use crate::overlap::Window;

/// Repetition cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl std::fmt::Display for IntervalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether monthly/yearly repetition preserves the day of the month or the
/// Nth-weekday-of-month position (e.g. "third Tuesday").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthType {
    Weekday,
    MonthDay,
}

/// Termination condition for a repeating rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finish {
    /// Stop after this many occurrences.
    Count(u32),
    /// Stop once the cursor passes this date (inclusive).
    Date(NaiveDate),
}

/// One scheduling intent: an anchor date, wall-clock bounds and a
/// repetition pattern.
#[expect(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Anchor date of the first occurrence.
    pub base_date: NaiveDate,
    /// Wall-clock start, float hours of day in `[0, 24)`.
    pub time_start: f64,
    /// Wall-clock stop, float hours of day in `(0, 24]`.
    pub time_stop: f64,
    /// Reserve the entire day, overriding both times to `[0, 24)`.
    pub full_day: bool,
    /// When false the rule yields exactly `[base_date]`.
    pub repeat: bool,
    pub interval_number: u32,
    pub interval_type: IntervalType,
    /// Selected weekdays; required when `interval_type` is `Week` and must
    /// contain `base_date`'s weekday.
    pub weekdays: std::collections::BTreeSet<Weekday>,
    pub month_type: MonthType,
    pub finish: Finish,
    /// Whether overlap checking is enforced for this rule's occurrences.
    pub validate: bool,
    /// Whether generated reservations start confirmed or requested.
    pub confirm: bool,
}

impl RecurrenceRule {
    /// ## Summary
    /// Builds a non-repeating rule for a single date and time span.
    #[must_use]
    pub fn once(base_date: NaiveDate, time_start: f64, time_stop: f64) -> Self {
        Self {
            base_date,
            time_start,
            time_stop,
            full_day: false,
            repeat: false,
            interval_number: 1,
            interval_type: IntervalType::Week,
            weekdays: std::collections::BTreeSet::new(),
            month_type: MonthType::MonthDay,
            finish: Finish::Count(1),
            validate: true,
            confirm: false,
        }
    }

    /// ## Summary
    /// Derives a non-repeating rule from an existing concrete window, the
    /// inverse of materialization. Used to attach a scheduler to an ad-hoc
    /// reservation.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidRule` when the window does not fit
    /// within one local day.
    pub fn from_window(window: &Window, tz: chrono_tz::Tz) -> ScheduleResult<Self> {
        let (base_date, time_start) = split_instant(window.start(), tz);
        let (stop_date, stop_hours) = split_instant(window.stop(), tz);

        let (time_stop, stops_at_midnight) = if stop_date == base_date {
            (stop_hours, false)
        } else if stop_date == base_date.succ_opt().unwrap_or(base_date) && stop_hours == 0.0 {
            // Stop at the following local midnight reads as hour 24
            (FULL_DAY_HOURS, true)
        } else {
            return Err(ScheduleError::InvalidRule(format!(
                "window {window} spans more than one local day in {tz}"
            )));
        };

        let mut rule = Self::once(base_date, time_start, time_stop);
        rule.full_day = stops_at_midnight && time_start == 0.0;

        rule.validate_and_normalize()
    }

    /// ## Summary
    /// Validates every rule invariant and returns a normalized copy:
    /// `time_start` rounded down to whole minutes, `time_stop` rounded down
    /// to whole seconds, and a full day pinned to `[0, 24)`.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidRule` for a degenerate time span, a
    /// zero interval or repetition count, a finish date before the base
    /// date, or a weekly rule whose weekday set is empty or excludes the
    /// base date's weekday. Bad values are rejected, never corrected.
    pub fn validate_and_normalize(&self) -> ScheduleResult<Self> {
        let mut rule = self.clone();

        if rule.full_day {
            rule.time_start = 0.0;
            rule.time_stop = FULL_DAY_HOURS;
        } else {
            rule.time_start = round_down(rule.time_start, START_GRANULARITY_HOURS);
            rule.time_stop = round_down(rule.time_stop, STOP_GRANULARITY_HOURS);

            if !(0.0..FULL_DAY_HOURS).contains(&rule.time_start) {
                return Err(ScheduleError::InvalidRule(format!(
                    "time_start {} is outside [0, 24)",
                    rule.time_start
                )));
            }
            if rule.time_stop <= 0.0 || rule.time_stop > FULL_DAY_HOURS {
                return Err(ScheduleError::InvalidRule(format!(
                    "time_stop {} is outside (0, 24]",
                    rule.time_stop
                )));
            }
            if rule.time_start >= rule.time_stop {
                return Err(ScheduleError::InvalidRule(
                    "reservation cannot finish before it starts".to_string(),
                ));
            }
        }

        if rule.repeat {
            if rule.interval_number < 1 {
                return Err(ScheduleError::InvalidRule(
                    "interval number must be greater than or equal to one".to_string(),
                ));
            }

            match rule.finish {
                Finish::Count(count) if count < 1 => {
                    return Err(ScheduleError::InvalidRule(
                        "repetition count must be greater than or equal to one".to_string(),
                    ));
                }
                Finish::Date(date) if date < rule.base_date => {
                    return Err(ScheduleError::InvalidRule(format!(
                        "finish date {date} is before base date {}",
                        rule.base_date
                    )));
                }
                Finish::Count(_) | Finish::Date(_) => {}
            }

            if rule.interval_type == IntervalType::Week {
                if rule.weekdays.is_empty() {
                    return Err(ScheduleError::InvalidRule(
                        "a weekly rule needs at least one weekday".to_string(),
                    ));
                }
                if !rule.matches_weekday(rule.base_date) {
                    return Err(ScheduleError::InvalidRule(format!(
                        "base date weekday {} is not among the selected weekdays",
                        rule.base_weekday()
                    )));
                }
            }
        }

        Ok(rule)
    }

    /// ## Summary
    /// Returns the weekday of the base date.
    #[must_use]
    pub fn base_weekday(&self) -> Weekday {
        self.base_date.weekday().into()
    }

    /// ## Summary
    /// Returns true when the given date's weekday is among the selected
    /// weekdays.
    #[must_use]
    pub fn matches_weekday(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&date.weekday().into())
    }

    /// ## Summary
    /// Returns the wall-clock span of one occurrence, honoring `full_day`.
    ///
    /// ## Errors
    /// Returns `ScheduleError::InvalidRule` when the time bounds are
    /// degenerate; validate the rule first to rule that out.
    pub fn day_span(&self) -> ScheduleResult<DaySpan> {
        if self.full_day {
            Ok(DaySpan::full_day())
        } else {
            DaySpan::new(self.time_start, self.time_stop)
        }
    }

    /// ## Summary
    /// Returns the length of one occurrence in float hours.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        if self.full_day {
            FULL_DAY_HOURS
        } else {
            (self.time_stop - self.time_start).max(0.0)
        }
    }
}

/// Rounds `value` down to a multiple of `multiple`.
///
/// The small epsilon keeps values whose binary representation sits just
/// under an exact multiple (e.g. `0.7 * 60`) from losing a whole step.
#[must_use]
pub fn round_down(value: f64, multiple: f64) -> f64 {
    ((value / multiple) + 1e-9).floor() * multiple
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn weekly(base: NaiveDate, weekdays: &[Weekday]) -> RecurrenceRule {
        let mut rule = RecurrenceRule::once(base, 9.0, 11.0);
        rule.repeat = true;
        rule.interval_type = IntervalType::Week;
        rule.weekdays = weekdays.iter().copied().collect::<BTreeSet<_>>();
        rule.finish = Finish::Count(4);
        rule
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_round_down_to_minute() {
        let rounded = round_down(10.99, START_GRANULARITY_HOURS);
        assert!((rounded - (659.0 / 60.0)).abs() < 1e-9);

        // 0.7 h is exactly 42 minutes despite its binary representation
        let exact = round_down(0.7, START_GRANULARITY_HOURS);
        assert!((exact - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_normalizes_times() {
        let rule = RecurrenceRule::once(date(2024, 1, 1), 9.999, 11.0)
            .validate_and_normalize()
            .expect("valid rule");
        assert!((rule.time_start - (599.0 / 60.0)).abs() < 1e-9);
        assert!((rule.time_stop - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_day_overrides_times() {
        let mut rule = RecurrenceRule::once(date(2024, 1, 1), 9.0, 8.0);
        rule.full_day = true;

        let rule = rule.validate_and_normalize().expect("full day is valid");
        assert!(rule.time_start.abs() < 1e-9);
        assert!((rule.time_stop - 24.0).abs() < 1e-9);
        assert!((rule.duration_hours() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_inverted_times() {
        let rule = RecurrenceRule::once(date(2024, 1, 1), 11.0, 9.0);
        assert!(matches!(
            rule.validate_and_normalize(),
            Err(ScheduleError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_day_times() {
        let early = RecurrenceRule::once(date(2024, 1, 1), -1.0, 9.0);
        assert!(early.validate_and_normalize().is_err());

        let late = RecurrenceRule::once(date(2024, 1, 1), 9.0, 25.0);
        assert!(late.validate_and_normalize().is_err());
    }

    #[test]
    fn test_rejects_zero_interval_number() {
        let mut rule = weekly(date(2024, 1, 1), &[Weekday::Monday]);
        rule.interval_number = 0;
        assert!(rule.validate_and_normalize().is_err());
    }

    #[test]
    fn test_rejects_finish_date_before_base() {
        let mut rule = weekly(date(2024, 1, 8), &[Weekday::Monday]);
        rule.finish = Finish::Date(date(2024, 1, 1));
        assert!(rule.validate_and_normalize().is_err());
    }

    #[test]
    fn test_weekly_rule_requires_base_weekday() {
        // 2024-01-01 is a Monday
        let missing = weekly(date(2024, 1, 1), &[Weekday::Tuesday]);
        assert!(missing.validate_and_normalize().is_err());

        let empty = weekly(date(2024, 1, 1), &[]);
        assert!(empty.validate_and_normalize().is_err());

        let valid = weekly(date(2024, 1, 1), &[Weekday::Monday, Weekday::Wednesday]);
        assert!(valid.validate_and_normalize().is_ok());
    }

    #[test]
    fn test_non_repeating_rule_skips_weekday_checks() {
        let rule = RecurrenceRule::once(date(2024, 1, 1), 9.0, 11.0);
        assert!(rule.weekdays.is_empty());
        assert!(rule.validate_and_normalize().is_ok());
    }
}
