//! Orchestration of the scheduling core: reconciling a recurrence rule's
//! occurrence set against its persisted reservations, and post-commit
//! notification dispatch.

pub mod error;
pub mod intent;
pub mod notify;
pub mod reconcile;
