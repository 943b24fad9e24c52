//! In-memory reference backend.
//!
//! Stands in for a relational backend with a native range-exclusion
//! constraint: the non-overlap invariant is enforced as check-then-write
//! under a single write guard, so conflicts surface at write time instead
//! of commit time. Plan application is all-or-nothing via snapshot restore.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use tessera_sched::overlap::Window;

use crate::error::{StoreError, StoreResult};
use crate::model::{NewReservation, Reservation};
use crate::store::{
    PlanOutcome, ReconcilePlan, ReservationStore, ResourceCatalog, ResourceFilter,
};

/// Reference [`ReservationStore`] backed by a map behind one `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Returns every reservation, ordered by ascending start. Intended for
    /// assertions and diagnostics.
    pub async fn snapshot(&self) -> Vec<Reservation> {
        let reservations = self.reservations.read().await;

        let mut all: Vec<Reservation> = reservations.values().cloned().collect();
        all.sort_by(|a, b| (a.start, a.id).cmp(&(b.start, b.id)));
        all
    }

    fn conflict_for(
        reservations: &HashMap<Uuid, Reservation>,
        candidate: &Reservation,
    ) -> Option<StoreError> {
        if !candidate.is_blocking() {
            return None;
        }

        for other in reservations.values() {
            if other.id != candidate.id
                && other.resource_id == candidate.resource_id
                && other.is_blocking()
                && other.start < candidate.stop
                && candidate.start < other.stop
            {
                return Some(StoreError::ResourceConflict {
                    resource_id: candidate.resource_id,
                    start: other.start,
                    stop: other.stop,
                });
            }
        }

        None
    }

    fn apply_plan_locked(
        reservations: &mut HashMap<Uuid, Reservation>,
        scheduler_id: Uuid,
        plan: ReconcilePlan,
    ) -> StoreResult<PlanOutcome> {
        // Deactivate the scheduler's children first so two records swapping
        // time slots never present an overlapping transient state.
        for record in reservations.values_mut() {
            if record.scheduler_id == Some(scheduler_id) {
                record.active = false;
            }
        }

        let mut outcome = PlanOutcome::default();
        let mut survivors: Vec<Uuid> = Vec::new();
        let mut created_ids: Vec<Uuid> = Vec::new();

        for update in plan.updates {
            Window::new(update.start, update.stop)?;

            let record = reservations
                .get_mut(&update.id)
                .ok_or(StoreError::ReservationNotFound(update.id))?;
            if record.scheduler_id != Some(scheduler_id) {
                return Err(StoreError::Storage(format!(
                    "reservation {} is not owned by scheduler {scheduler_id}",
                    update.id
                )));
            }

            record.start = update.start;
            record.stop = update.stop;
            record.state = update.state;
            record.validate = update.validate;

            survivors.push(update.id);
            outcome.updated.push(update.id);
        }

        for new in plan.creates {
            Window::new(new.start, new.stop)?;

            let reservation = Reservation {
                id: Uuid::new_v4(),
                resource_id: new.resource_id,
                name: new.name,
                description: new.description,
                start: new.start,
                stop: new.stop,
                state: new.state,
                active: false,
                validate: new.validate,
                scheduler_id: new.scheduler_id,
            };

            survivors.push(reservation.id);
            created_ids.push(reservation.id);
            reservations.insert(reservation.id, reservation);
        }

        for id in plan.delete_ids {
            let removed = reservations
                .remove(&id)
                .ok_or(StoreError::ReservationNotFound(id))?;
            if removed.scheduler_id != Some(scheduler_id) {
                return Err(StoreError::Storage(format!(
                    "reservation {id} is not owned by scheduler {scheduler_id}"
                )));
            }

            outcome.deleted_ids.push(id);
        }

        // Reactivate survivors, then hold the final state to the invariant
        for id in &survivors {
            if let Some(record) = reservations.get_mut(id) {
                record.active = true;
            }
        }

        for id in &survivors {
            if let Some(record) = reservations.get(id) {
                if let Some(conflict) = Self::conflict_for(reservations, record) {
                    return Err(conflict);
                }
            }
        }

        // Copy created records only now, so the outcome carries their
        // committed (reactivated) state
        for id in &created_ids {
            if let Some(record) = reservations.get(id) {
                outcome.created.push(record.clone());
            }
        }

        Ok(outcome)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn children_of(&self, scheduler_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let reservations = self.reservations.read().await;

        let mut children: Vec<Reservation> = reservations
            .values()
            .filter(|record| record.scheduler_id == Some(scheduler_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| (a.start, a.id).cmp(&(b.start, b.id)));

        Ok(children)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        let reservations = self.reservations.read().await;

        Ok(reservations.get(&id).cloned())
    }

    async fn insert(&self, new: NewReservation) -> StoreResult<Reservation> {
        Window::new(new.start, new.stop)?;

        let mut reservations = self.reservations.write().await;

        let reservation = Reservation {
            id: Uuid::new_v4(),
            resource_id: new.resource_id,
            name: new.name,
            description: new.description,
            start: new.start,
            stop: new.stop,
            state: new.state,
            active: true,
            validate: new.validate,
            scheduler_id: new.scheduler_id,
        };

        // Check-then-write stays atomic under the held write guard
        if let Some(conflict) = Self::conflict_for(&reservations, &reservation) {
            return Err(conflict);
        }

        tracing::debug!(
            reservation_id = %reservation.id,
            resource_id = %reservation.resource_id,
            "Inserted reservation"
        );
        reservations.insert(reservation.id, reservation.clone());

        Ok(reservation)
    }

    async fn apply_plan(
        &self,
        scheduler_id: Uuid,
        plan: ReconcilePlan,
    ) -> StoreResult<PlanOutcome> {
        let mut reservations = self.reservations.write().await;
        let snapshot = reservations.clone();

        match Self::apply_plan_locked(&mut reservations, scheduler_id, plan) {
            Ok(outcome) => {
                tracing::debug!(
                    %scheduler_id,
                    updated = outcome.updated.len(),
                    created = outcome.created.len(),
                    deleted = outcome.deleted_ids.len(),
                    "Applied reconciliation plan"
                );
                Ok(outcome)
            }
            Err(err) => {
                *reservations = snapshot;
                tracing::warn!(%scheduler_id, %err, "Rolled back reconciliation plan");
                Err(err)
            }
        }
    }

    async fn busy_resources(&self, window: &Window) -> StoreResult<HashSet<Uuid>> {
        let reservations = self.reservations.read().await;

        Ok(reservations
            .values()
            .filter(|record| record.is_blocking() && record.overlaps(window))
            .map(|record| record.resource_id)
            .collect())
    }
}

/// Reference [`ResourceCatalog`] mapping resource ids to type ids.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    resources: RwLock<HashMap<Uuid, Uuid>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Registers a resource of the given type and returns its id.
    pub async fn add_resource(&self, type_id: Uuid) -> Uuid {
        let resource_id = Uuid::new_v4();

        let mut resources = self.resources.write().await;
        resources.insert(resource_id, type_id);

        resource_id
    }
}

#[async_trait]
impl ResourceCatalog for MemoryCatalog {
    async fn resource_ids(&self, filter: &ResourceFilter) -> StoreResult<Vec<Uuid>> {
        let resources = self.resources.read().await;

        let mut ids: Vec<Uuid> = resources
            .iter()
            .filter(|(resource_id, type_id)| {
                if !filter.resource_ids.is_empty() && !filter.resource_ids.contains(resource_id) {
                    return false;
                }
                if filter.type_ids.is_empty() {
                    return true;
                }

                let matches = filter.type_ids.contains(type_id);
                if filter.exclude_types { !matches } else { matches }
            })
            .map(|(resource_id, _)| *resource_id)
            .collect();
        ids.sort_unstable();

        Ok(ids)
    }

    async fn resource_exists(&self, id: Uuid) -> StoreResult<bool> {
        let resources = self.resources.read().await;

        Ok(resources.contains_key(&id))
    }

    async fn resource_type(&self, id: Uuid) -> StoreResult<Option<Uuid>> {
        let resources = self.resources.read().await;

        Ok(resources.get(&id).copied())
    }
}
