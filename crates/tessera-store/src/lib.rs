//! Persistence boundary for reservations: the store and catalog traits, the
//! reconciliation plan types, the availability query, and an in-memory
//! reference backend that enforces the non-overlap invariant.

pub mod availability;
pub mod error;
pub mod memory;
pub mod model;
pub mod store;
