//! End-to-end reconciliation against the in-memory backend.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use tessera_core::config::SchedulingConfig;
use tessera_core::types::{ReservationState, Weekday};
use tessera_sched::error::ScheduleError;
use tessera_sched::rule::{Finish, IntervalType, RecurrenceRule};
use tessera_service::error::ServiceError;
use tessera_service::intent::SchedulerIntent;
use tessera_service::notify::NotificationDispatcher;
use tessera_service::reconcile::{reconcile, reconcile_bounded};
use tessera_store::error::StoreError;
use tessera_store::memory::MemoryStore;
use tessera_store::model::{NewReservation, Reservation};
use tessera_store::store::ReservationStore;

/// Captures every dispatched batch for assertions.
#[derive(Debug, Default)]
struct RecordingDispatcher {
    batches: Mutex<Vec<Vec<Reservation>>>,
}

impl RecordingDispatcher {
    async fn dispatched(&self) -> Vec<Vec<Reservation>> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn reservations_requested(&self, reservations: &[Reservation]) -> anyhow::Result<()> {
        self.batches.lock().await.push(reservations.to_vec());
        Ok(())
    }
}

/// Always fails, standing in for an unreachable delivery channel.
#[derive(Debug, Default)]
struct FailingDispatcher;

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn reservations_requested(&self, _reservations: &[Reservation]) -> anyhow::Result<()> {
        anyhow::bail!("delivery channel unavailable")
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Weekly Mondays 09:00-11:00 starting 2024-01-01 (a Monday).
fn weekly_mondays(count: u32) -> RecurrenceRule {
    let mut rule = RecurrenceRule::once(date(2024, 1, 1), 9.0, 11.0);
    rule.repeat = true;
    rule.interval_type = IntervalType::Week;
    rule.weekdays = [Weekday::Monday].into_iter().collect::<BTreeSet<_>>();
    rule.finish = Finish::Count(count);
    rule
}

#[test_log::test(tokio::test)]
async fn test_reconcile_materializes_all_occurrences() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(3));

    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .expect("reconcile succeeds against an empty store");

    assert!(outcome.updated.is_empty());
    assert_eq!(outcome.created.len(), 3);
    assert!(outcome.deleted_ids.is_empty());

    let children = store.children_of(intent.scheduler_id).await.unwrap();
    let starts: Vec<_> = children.iter().map(|child| child.start).collect();
    assert_eq!(
        starts,
        vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        ]
    );
    assert!(children.iter().all(|child| child.active));
    assert!(
        children
            .iter()
            .all(|child| child.state == ReservationState::Requested)
    );
}

#[test_log::test(tokio::test)]
async fn test_shrinking_rule_updates_survivor_and_deletes_surplus() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let mut intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(3));

    reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();
    let before = store.children_of(intent.scheduler_id).await.unwrap();
    assert_eq!(before.len(), 3);

    intent.rule.finish = Finish::Count(1);
    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();

    assert_eq!(outcome.updated, vec![before[0].id]);
    assert!(outcome.created.is_empty());
    assert_eq!(outcome.deleted_ids, vec![before[1].id, before[2].id]);

    let after = store.children_of(intent.scheduler_id).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
}

#[test_log::test(tokio::test)]
async fn test_growing_rule_keeps_existing_and_creates_the_rest() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let mut intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(1));

    reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();
    let before = store.children_of(intent.scheduler_id).await.unwrap();

    intent.rule.finish = Finish::Count(3);
    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();

    assert_eq!(outcome.updated, vec![before[0].id]);
    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.deleted_ids.is_empty());

    let after = store.children_of(intent.scheduler_id).await.unwrap();
    assert_eq!(after.len(), 3);
}

#[test_log::test(tokio::test)]
async fn test_reconcile_is_idempotent() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(3));

    reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();
    let before = store.snapshot().await;

    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();

    assert_eq!(outcome.updated.len(), 3);
    assert!(outcome.created.is_empty());
    assert!(outcome.deleted_ids.is_empty());
    assert_eq!(store.snapshot().await, before);
}

#[test_log::test(tokio::test)]
async fn test_conflicting_occurrence_rolls_back_everything() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let resource_id = Uuid::new_v4();

    // A foreign blocking reservation occupies the second Monday
    store
        .insert(NewReservation {
            resource_id,
            name: None,
            description: None,
            start: Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap(),
            stop: Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap(),
            state: ReservationState::Confirmed,
            validate: true,
            scheduler_id: None,
        })
        .await
        .unwrap();
    let before = store.snapshot().await;

    let mut intent = SchedulerIntent::new(resource_id, weekly_mondays(3));
    intent.rule.confirm = true;

    let err = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .expect_err("occupied slot must fail the whole run");
    assert!(matches!(
        err,
        ServiceError::Store(StoreError::ResourceConflict { .. })
    ));

    // All-or-nothing: the first Monday was not committed either
    assert_eq!(store.snapshot().await, before);
    assert!(dispatcher.dispatched().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_requested_reservations_are_dispatched() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(2));

    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();

    let batches = dispatcher.dispatched().await;
    assert_eq!(batches.len(), 1);

    let ids: Vec<Uuid> = batches[0].iter().map(|r| r.id).collect();
    assert_eq!(ids, outcome.created);

    // Dispatched records reflect the committed state
    assert!(batches[0].iter().all(|r| r.active));
}

#[test_log::test(tokio::test)]
async fn test_confirmed_reservations_are_not_dispatched() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let mut intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(2));
    intent.rule.confirm = true;

    reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .unwrap();

    assert!(dispatcher.dispatched().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_dispatch_failure_does_not_fail_the_run() {
    let store = MemoryStore::new();
    let dispatcher = FailingDispatcher;
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(2));

    let outcome = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .expect("notification failure is swallowed after commit");

    assert_eq!(outcome.created.len(), 2);
    assert_eq!(store.children_of(intent.scheduler_id).await.unwrap().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_local_wall_clock_is_preserved_across_reconcile() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(2));

    // 09:00 Madrid is 08:00 UTC in January (CET, +01:00)
    reconcile(&store, &dispatcher, &intent, chrono_tz::Europe::Madrid)
        .await
        .unwrap();

    let children = store.children_of(intent.scheduler_id).await.unwrap();
    let starts: Vec<_> = children.iter().map(|child| child.start).collect();
    assert_eq!(
        starts,
        vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap(),
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_configured_iteration_ceiling_caps_generation() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();
    let intent = SchedulerIntent::new(Uuid::new_v4(), weekly_mondays(10));

    let config = SchedulingConfig {
        availability_margin_minutes: 60,
        recurrence_iteration_limit: 4,
    };

    let err = reconcile_bounded(
        &store,
        &dispatcher,
        &intent,
        chrono_tz::UTC,
        config.recurrence_iteration_limit,
    )
    .await
    .expect_err("ten occurrences cannot fit a ceiling of four");
    assert!(matches!(
        err,
        ServiceError::Schedule(ScheduleError::RecurrenceOverflow { limit: 4 })
    ));
    assert!(store.snapshot().await.is_empty());

    // A roomier configured ceiling lets the same rule through
    let outcome = reconcile_bounded(&store, &dispatcher, &intent, chrono_tz::UTC, 16)
        .await
        .unwrap();
    assert_eq!(outcome.created.len(), 10);
}

#[test_log::test(tokio::test)]
async fn test_invalid_rule_is_rejected_before_touching_the_store() {
    let store = MemoryStore::new();
    let dispatcher = RecordingDispatcher::default();

    let mut intent = SchedulerIntent::new(
        Uuid::new_v4(),
        RecurrenceRule::once(date(2024, 1, 1), 11.0, 9.0),
    );
    intent.rule.repeat = false;

    let err = reconcile(&store, &dispatcher, &intent, chrono_tz::UTC)
        .await
        .expect_err("inverted times must be rejected");
    assert!(matches!(err, ServiceError::Schedule(_)));
    assert!(store.snapshot().await.is_empty());
}
