//! Shared configuration, constants and types for the tessera reservation
//! engine.

pub mod config;
pub mod constants;
pub mod types;
