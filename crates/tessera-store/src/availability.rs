//! Availability: which resources are free in a window.
//!
//! Computed as a set difference: every catalog resource matching the
//! filter, minus the resources with at least one blocking reservation
//! overlapping the window. A resource with no reservations at all is
//! therefore reported free, which per-row filtering would miss.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use tessera_sched::overlap::Window;

use crate::error::StoreResult;
use crate::store::{ReservationStore, ResourceCatalog, ResourceFilter};

/// ## Summary
/// Returns the ids of resources free over the whole window.
///
/// ## Errors
/// Returns a storage error if the catalog or reservation lookup fails.
pub async fn query_availability<S, C>(
    store: &S,
    catalog: &C,
    window: &Window,
    filter: &ResourceFilter,
) -> StoreResult<Vec<Uuid>>
where
    S: ReservationStore + ?Sized,
    C: ResourceCatalog + ?Sized,
{
    let candidates = catalog.resource_ids(filter).await?;
    let busy = store.busy_resources(window).await?;

    let free: Vec<Uuid> = candidates
        .into_iter()
        .filter(|id| !busy.contains(id))
        .collect();

    tracing::debug!(%window, busy = busy.len(), free = free.len(), "Computed availability");

    Ok(free)
}

/// ## Summary
/// Returns the ids of resources free from `now` through the forward
/// margin, so a resource about to be occupied still reads busy.
///
/// ## Errors
/// Returns `ScheduleError::InvalidInterval` (as a store error) when the
/// margin is not positive, or a storage error if a lookup fails.
pub async fn available_now<S, C>(
    store: &S,
    catalog: &C,
    now: DateTime<Utc>,
    margin: TimeDelta,
    filter: &ResourceFilter,
) -> StoreResult<Vec<Uuid>>
where
    S: ReservationStore + ?Sized,
    C: ResourceCatalog + ?Sized,
{
    let window = Window::new(now, now + margin)?;

    query_availability(store, catalog, &window, filter).await
}
