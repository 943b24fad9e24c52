//! Traits at the persistence boundary and the reconciliation plan types.
//!
//! The engine never talks to a concrete database: it is written against
//! [`ReservationStore`] and [`ResourceCatalog`], and any backend that keeps
//! the invariants documented here can stand behind them. The reference
//! backend lives in [`crate::memory`].

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use tessera_sched::overlap::Window;

use crate::error::StoreResult;
use crate::model::{NewReservation, Reservation, ReservationUpdate};

/// The diff the reconciler wants applied for one scheduler: in-place
/// updates for records that survive, inserts for surplus occurrences, and
/// deletes for surplus records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub updates: Vec<ReservationUpdate>,
    pub creates: Vec<NewReservation>,
    pub delete_ids: Vec<Uuid>,
}

impl ReconcilePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty() && self.delete_ids.is_empty()
    }
}

/// What a plan application actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Ids of records rewritten in place.
    pub updated: Vec<Uuid>,
    /// Newly inserted records, in plan order.
    pub created: Vec<Reservation>,
    /// Ids of records removed.
    pub deleted_ids: Vec<Uuid>,
}

/// Candidate restriction for catalog lookups. Empty lists mean "no
/// restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub type_ids: Vec<Uuid>,
    /// When set, `type_ids` excludes instead of restricting.
    pub exclude_types: bool,
    pub resource_ids: Vec<Uuid>,
}

impl ResourceFilter {
    /// ## Summary
    /// A filter matching every resource.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_types(mut self, type_ids: Vec<Uuid>) -> Self {
        self.type_ids = type_ids;
        self
    }

    #[must_use]
    pub fn excluding_types(mut self) -> Self {
        self.exclude_types = true;
        self
    }

    #[must_use]
    pub fn with_resources(mut self, resource_ids: Vec<Uuid>) -> Self {
        self.resource_ids = resource_ids;
        self
    }
}

/// Persistence contract for reservations.
///
/// Implementations must reject any write that would leave two overlapping
/// blocking reservations (active, validated, confirmed) on one resource,
/// surfacing it as `StoreError::ResourceConflict`. Backends without native
/// range exclusion do this as check-then-write under a lock, which moves
/// detection from commit time to write time.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// ## Summary
    /// Loads the reservations owned by a scheduler, ordered by ascending
    /// start.
    ///
    /// ## Errors
    /// Returns a storage error if the lookup fails.
    async fn children_of(&self, scheduler_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// ## Summary
    /// Loads one reservation by id.
    ///
    /// ## Errors
    /// Returns a storage error if the lookup fails.
    async fn get(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    /// ## Summary
    /// Inserts a single ad-hoc reservation, subject to the conflict guard.
    ///
    /// ## Errors
    /// Returns `StoreError::ResourceConflict` when the new record would
    /// block against an existing blocking reservation, or a storage error
    /// if the write fails.
    async fn insert(&self, new: NewReservation) -> StoreResult<Reservation>;

    /// ## Summary
    /// Applies a reconciliation plan for one scheduler atomically: the
    /// scheduler's children are deactivated, the plan is applied, survivors
    /// are reactivated, and the conflict guard is enforced on the final
    /// state. All-or-nothing: on any failure the store is left exactly as
    /// it was before the call.
    ///
    /// ## Errors
    /// Returns `StoreError::ResourceConflict` when the final state would
    /// violate the non-overlap invariant, `StoreError::ReservationNotFound`
    /// when the plan references a missing record, or a storage error if a
    /// write fails. Every error implies a full rollback.
    async fn apply_plan(&self, scheduler_id: Uuid, plan: ReconcilePlan)
    -> StoreResult<PlanOutcome>;

    /// ## Summary
    /// Returns the ids of resources with at least one blocking reservation
    /// overlapping the window.
    ///
    /// ## Errors
    /// Returns a storage error if the query fails.
    async fn busy_resources(&self, window: &Window) -> StoreResult<HashSet<Uuid>>;
}

/// Resource catalog lookups, consumed as an opaque external collaborator.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// ## Summary
    /// Returns the ids of resources matching the filter.
    ///
    /// ## Errors
    /// Returns a storage error if the lookup fails.
    async fn resource_ids(&self, filter: &ResourceFilter) -> StoreResult<Vec<Uuid>>;

    /// ## Summary
    /// Returns true when the resource exists.
    ///
    /// ## Errors
    /// Returns a storage error if the lookup fails.
    async fn resource_exists(&self, id: Uuid) -> StoreResult<bool>;

    /// ## Summary
    /// Returns the type of a resource, if the resource exists.
    ///
    /// ## Errors
    /// Returns a storage error if the lookup fails.
    async fn resource_type(&self, id: Uuid) -> StoreResult<Option<Uuid>>;
}
