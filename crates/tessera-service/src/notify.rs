//! Post-commit notification dispatch.
//!
//! Dispatch happens after the plan has committed and never influences the
//! outcome: a failing dispatcher is logged and swallowed by the caller.

use async_trait::async_trait;

use tessera_store::model::Reservation;

/// Receives reservations that were materialized in the requested state and
/// await approval.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// ## Summary
    /// Notifies approvers that the given reservations were created in the
    /// requested state.
    ///
    /// ## Errors
    /// Returns an error when delivery fails. Callers treat this as
    /// fire-and-forget.
    async fn reservations_requested(&self, reservations: &[Reservation]) -> anyhow::Result<()>;
}

/// Dispatcher that only emits a structured log line per reservation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

#[async_trait]
impl NotificationDispatcher for TracingDispatcher {
    async fn reservations_requested(&self, reservations: &[Reservation]) -> anyhow::Result<()> {
        for reservation in reservations {
            tracing::info!(
                reservation_id = %reservation.id,
                resource_id = %reservation.resource_id,
                start = %reservation.start,
                stop = %reservation.stop,
                "Reservation awaiting approval"
            );
        }

        Ok(())
    }
}
