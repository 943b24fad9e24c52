/// Scheduling constants shared across crates
///
/// Ceiling on recurrence generation iterations. A rule whose stepping never
/// reaches its finish condition fails with an overflow error instead of
/// looping forever.
pub const MAX_RECURRENCE_ITERATIONS: usize = 1024;

/// Forward margin, in minutes, applied to "currently available" queries.
pub const DEFAULT_AVAILABILITY_MARGIN_MINUTES: i64 = 60;

/// Granularity of reservation start times: one minute, in hours.
pub const START_GRANULARITY_HOURS: f64 = 1.0 / 60.0;

/// Granularity of reservation stop times: one second, in hours.
pub const STOP_GRANULARITY_HOURS: f64 = 1.0 / 3600.0;

/// Wall-clock hours in a full-day reservation.
pub const FULL_DAY_HOURS: f64 = 24.0;
