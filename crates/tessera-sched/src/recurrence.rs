//! Occurrence date generation: rule → ordered list of anchor dates.
//!
//! Generation is a pure function of the rule. The cursor starts at the base
//! date and is advanced by [`next_repetition_date`] until the finish
//! condition is met; a hard iteration ceiling guards against rules whose
//! stepping can never terminate.

use chrono::{Datelike, Days, Months, NaiveDate};

use tessera_core::constants::MAX_RECURRENCE_ITERATIONS;

use crate::error::{ScheduleError, ScheduleResult};
use crate::rule::{Finish, IntervalType, MonthType, RecurrenceRule};

/// ## Summary
/// Returns the ordered occurrence dates of a rule, using the default
/// iteration ceiling.
///
/// ## Errors
/// Returns `ScheduleError::RecurrenceOverflow` when the ceiling is
/// exceeded, or `ScheduleError::InvalidRule` when stepping cannot advance.
pub fn occurrences(rule: &RecurrenceRule) -> ScheduleResult<Vec<NaiveDate>> {
    occurrences_bounded(rule, MAX_RECURRENCE_ITERATIONS)
}

/// ## Summary
/// Returns the ordered occurrence dates of a rule with an explicit
/// iteration ceiling.
///
/// A non-repeating rule yields exactly its base date. For weekly rules the
/// cursor date is appended only when its weekday is selected; every other
/// interval type always qualifies.
///
/// ## Errors
/// Returns `ScheduleError::RecurrenceOverflow` when `limit` iterations pass
/// without reaching the finish condition, or `ScheduleError::InvalidRule`
/// when stepping cannot advance.
pub fn occurrences_bounded(
    rule: &RecurrenceRule,
    limit: usize,
) -> ScheduleResult<Vec<NaiveDate>> {
    if !rule.repeat {
        return Ok(vec![rule.base_date]);
    }

    let mut dates = Vec::new();
    let mut cursor = rule.base_date;
    let mut iterations = 0_usize;

    while !reached_finish(rule, &dates, cursor) {
        iterations += 1;
        if iterations > limit {
            tracing::warn!(%cursor, limit, "Recurrence generation exceeded iteration ceiling");
            return Err(ScheduleError::RecurrenceOverflow { limit });
        }

        if rule.interval_type != IntervalType::Week || rule.matches_weekday(cursor) {
            dates.push(cursor);
        }

        cursor = next_repetition_date(rule, cursor)?;
    }

    Ok(dates)
}

/// ## Summary
/// Returns the first occurrence date strictly after `after`, if the rule
/// has one. Backs "next scheduled on" displays.
///
/// ## Errors
/// Propagates generation errors from [`occurrences`].
pub fn next_occurrence_after(
    rule: &RecurrenceRule,
    after: NaiveDate,
) -> ScheduleResult<Option<NaiveDate>> {
    Ok(occurrences(rule)?.into_iter().find(|date| *date > after))
}

fn reached_finish(rule: &RecurrenceRule, dates: &[NaiveDate], cursor: NaiveDate) -> bool {
    match rule.finish {
        Finish::Count(count) => dates.len() >= usize::try_from(count).unwrap_or(usize::MAX),
        Finish::Date(date) => cursor > date,
    }
}

/// ## Summary
/// Advances the cursor by one repetition step.
///
/// - `Year`: adds `interval_number` calendar years, clamping the day of
///   month where needed (Feb 29 → Feb 28).
/// - `Month`/`MonthDay`: adds `interval_number` calendar months, clamping
///   the day of month.
/// - `Month`/`Weekday`: keeps the Nth-weekday-of-month position by stepping
///   four weeks per month and one more week when the position regresses.
///   A fifth-weekday position can therefore drift into the following month.
/// - `Week`: advances one day at a time until a selected weekday matches.
/// - `Day`: adds `interval_number` days.
///
/// ## Errors
/// Returns `ScheduleError::InvalidRule` when the step leaves the supported
/// calendar range or a weekly rule has no selected weekday to land on.
pub fn next_repetition_date(rule: &RecurrenceRule, cursor: NaiveDate) -> ScheduleResult<NaiveDate> {
    let interval = rule.interval_number;

    let next = match rule.interval_type {
        IntervalType::Year => interval
            .checked_mul(12)
            .and_then(|months| cursor.checked_add_months(Months::new(months))),
        IntervalType::Month => match rule.month_type {
            MonthType::MonthDay => cursor.checked_add_months(Months::new(interval)),
            MonthType::Weekday => week_day_position(cursor, interval),
        },
        IntervalType::Week => return next_selected_weekday(rule, cursor),
        IntervalType::Day => cursor.checked_add_days(Days::new(u64::from(interval))),
    };

    next.ok_or_else(|| {
        ScheduleError::InvalidRule("rule advances beyond the supported calendar range".to_string())
    })
}

fn next_selected_weekday(rule: &RecurrenceRule, cursor: NaiveDate) -> ScheduleResult<NaiveDate> {
    let mut next = cursor;

    // A selected weekday is at most seven days away
    for _ in 0..7 {
        next = next.succ_opt().ok_or_else(|| {
            ScheduleError::InvalidRule(
                "rule advances beyond the supported calendar range".to_string(),
            )
        })?;

        if rule.matches_weekday(next) {
            return Ok(next);
        }
    }

    Err(ScheduleError::InvalidRule(
        "a weekly rule needs at least one weekday".to_string(),
    ))
}

/// Computes the same Nth-weekday position `months` months ahead (e.g. keeps
/// a "third Tuesday" pattern). Four weeks are added per month, plus one more
/// week whenever the weekday position regresses.
fn week_day_position(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    let position = nth_weekday_of_month(start);

    let mut next = start;
    for _ in 0..months {
        next = next.checked_add_days(Days::new(28))?;
        if nth_weekday_of_month(next) < position {
            next = next.checked_add_days(Days::new(7))?;
        }
    }

    Some(next)
}

/// ## Summary
/// Returns which repetition of its weekday the date is within its month
/// (1 for the first Tuesday, 3 for the third Tuesday, and so on).
#[must_use]
pub fn nth_weekday_of_month(date: NaiveDate) -> u32 {
    (date.day() + 6) / 7
}
