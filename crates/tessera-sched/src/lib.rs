//! Pure scheduling logic: recurrence rules, occurrence generation, interval
//! materialization and overlap arithmetic. No I/O happens in this crate.

pub mod error;
pub mod interval;
pub mod overlap;
pub mod recurrence;
pub mod rule;
