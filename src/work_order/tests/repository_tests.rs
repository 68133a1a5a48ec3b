//! Tests for the in-memory work-order repository.

use std::sync::Arc;

use super::support::actor;
use crate::access::domain::UserId;
use crate::machinery::domain::MachineId;
use crate::work_order::{
    adapters::memory::InMemoryWorkOrderRepository,
    domain::{
        PendingWorkOrder, Presence, Priority, WorkOrder, WorkOrderDetails, WorkOrderId,
        WorkOrderStatus, WorkOrderTransition,
    },
    ports::{WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryError},
};
use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn repository() -> InMemoryWorkOrderRepository {
    InMemoryWorkOrderRepository::new()
}

fn pending(machine: MachineId, title: &str, priority: Priority) -> PendingWorkOrder {
    let details = WorkOrderDetails::new(title, "Raised by test")
        .expect("valid details")
        .with_priority(priority);
    PendingWorkOrder::new(machine, details, Some(UserId::new()), &DefaultClock)
}

async fn insert(
    repository: &InMemoryWorkOrderRepository,
    machine: MachineId,
    title: &str,
) -> WorkOrder {
    repository
        .insert_numbered(pending(machine, title, Priority::Medium))
        .await
        .expect("insert succeeds")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn numbers_increase_from_one(repository: InMemoryWorkOrderRepository) {
    let machine = MachineId::new();

    let first = insert(&repository, machine, "First").await;
    let second = insert(&repository, machine, "Second").await;

    assert_eq!(first.numbers().correlative().value(), 1);
    assert_eq!(first.numbers().odt_number().value(), 1);
    assert_eq!(second.numbers().correlative().value(), 2);
    assert_eq!(second.numbers().odt_number().value(), 2);
    assert_eq!(first.status(), WorkOrderStatus::Draft);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_inserts_never_share_numbers() {
    let repository = Arc::new(InMemoryWorkOrderRepository::new());
    let machine = MachineId::new();

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let repo = Arc::clone(&repository);
            tokio::spawn(async move {
                repo.insert_numbered(pending(machine, &format!("Order {n}"), Priority::Low))
                    .await
            })
        })
        .collect();
    let mut correlatives = Vec::new();
    for handle in handles {
        let order = handle
            .await
            .expect("task joins")
            .expect("insert succeeds");
        correlatives.push(order.numbers().correlative().value());
    }
    correlatives.sort_unstable();

    assert_eq!(correlatives, (1..=16).collect::<Vec<u64>>());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inserting_the_same_draft_twice_is_rejected(repository: InMemoryWorkOrderRepository) {
    let draft = pending(MachineId::new(), "Once", Priority::High);
    repository
        .insert_numbered(draft.clone())
        .await
        .expect("first insert succeeds");

    let result = repository.insert_numbered(draft.clone()).await;

    assert!(matches!(
        result,
        Err(WorkOrderRepositoryError::DuplicateWorkOrder(id)) if id == draft.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn guarded_update_refuses_stale_writes(repository: InMemoryWorkOrderRepository) {
    let submitter = actor("Submitter");
    let stored = insert(&repository, MachineId::new(), "Guarded").await;
    let transition = WorkOrderTransition::SubmitRequest;

    let mut winner = stored.clone();
    winner
        .apply(&transition, &submitter, &DefaultClock)
        .expect("draft can be submitted");
    let mut loser = stored.clone();
    loser
        .apply(&transition, &submitter, &DefaultClock)
        .expect("draft can be submitted");

    let first = repository
        .update_guarded(&winner, &transition.guard())
        .await
        .expect("update succeeds");
    let second = repository
        .update_guarded(&loser, &transition.guard())
        .await
        .expect("update succeeds");

    assert!(first);
    assert!(!second);
    let current = repository
        .find_by_id(stored.id())
        .await
        .expect("lookup succeeds")
        .expect("order exists");
    assert_eq!(current, winner);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn updating_a_missing_order_is_not_found(repository: InMemoryWorkOrderRepository) {
    let ghost = super::support::draft(None);

    let result = repository.update(&ghost).await;

    assert!(matches!(
        result,
        Err(WorkOrderRepositoryError::NotFound(id)) if id == ghost.id()
    ));
    assert_eq!(
        repository
            .find_by_id(WorkOrderId::new())
            .await
            .expect("lookup succeeds"),
        None
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_filters_and_orders_newest_first(repository: InMemoryWorkOrderRepository) {
    let press = MachineId::new();
    let lathe = MachineId::new();
    let first = insert(&repository, press, "Press oil change").await;
    let second = insert(&repository, lathe, "Lathe belt").await;
    let third = insert(&repository, press, "Press hydraulic leak").await;

    let all = repository
        .list(&WorkOrderFilter::default())
        .await
        .expect("list succeeds");
    let press_only = repository
        .list(&WorkOrderFilter {
            machine: Some(press),
            ..WorkOrderFilter::default()
        })
        .await
        .expect("list succeeds");
    let by_text = repository
        .list(&WorkOrderFilter {
            text: Some("HYDRAULIC".to_owned()),
            ..WorkOrderFilter::default()
        })
        .await
        .expect("list succeeds");

    let ids = |orders: &[WorkOrder]| orders.iter().map(WorkOrder::id).collect::<Vec<_>>();
    assert_eq!(ids(&all), vec![third.id(), second.id(), first.id()]);
    assert_eq!(ids(&press_only), vec![third.id(), first.id()]);
    assert_eq!(ids(&by_text), vec![third.id()]);
}

#[rstest]
fn filter_checks_sign_off_presence() {
    let order = super::support::draft(None);
    let awaiting_review = WorkOrderFilter {
        reviewer: Presence::Unset,
        ..WorkOrderFilter::with_statuses([WorkOrderStatus::Draft])
    };
    let reviewed = WorkOrderFilter {
        reviewer: Presence::Set,
        ..WorkOrderFilter::default()
    };

    assert!(awaiting_review.matches(&order));
    assert!(!reviewed.matches(&order));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn open_order_lookup_respects_window_and_status(repository: InMemoryWorkOrderRepository) {
    let machine = MachineId::new();
    let submitter = actor("Submitter");
    let week_ago = Utc::now() - TimeDelta::days(7);

    assert!(
        !repository
            .exists_open_for_machine_since(machine, week_ago)
            .await
            .expect("lookup succeeds")
    );

    let mut order = insert(&repository, machine, "Open draft").await;
    assert!(
        repository
            .exists_open_for_machine_since(machine, week_ago)
            .await
            .expect("lookup succeeds")
    );
    assert!(
        !repository
            .exists_open_for_machine_since(machine, Utc::now() + TimeDelta::minutes(1))
            .await
            .expect("lookup succeeds")
    );
    assert!(
        !repository
            .exists_open_for_machine_since(MachineId::new(), week_ago)
            .await
            .expect("lookup succeeds")
    );

    order
        .apply(&WorkOrderTransition::SubmitRequest, &submitter, &DefaultClock)
        .expect("draft can be submitted");
    repository.update(&order).await.expect("update succeeds");

    assert!(
        !repository
            .exists_open_for_machine_since(machine, week_ago)
            .await
            .expect("lookup succeeds")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn insert_unless_open_skips_machines_with_an_open_order(
    repository: InMemoryWorkOrderRepository,
) {
    let machine = MachineId::new();
    let week_ago = Utc::now() - TimeDelta::days(7);

    let first = repository
        .insert_numbered_unless_open(pending(machine, "First draft", Priority::Medium), week_ago)
        .await
        .expect("insert runs");
    let second = repository
        .insert_numbered_unless_open(pending(machine, "Second draft", Priority::Medium), week_ago)
        .await
        .expect("insert runs");
    let elsewhere = repository
        .insert_numbered_unless_open(
            pending(MachineId::new(), "Other machine", Priority::Medium),
            week_ago,
        )
        .await
        .expect("insert runs");

    assert_eq!(
        first.map(|order| order.numbers().correlative().value()),
        Some(1)
    );
    assert!(second.is_none());
    assert_eq!(
        elsewhere.map(|order| order.numbers().correlative().value()),
        Some(2)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_inserts_unless_open_store_one_draft() {
    let repository = Arc::new(InMemoryWorkOrderRepository::new());
    let machine = MachineId::new();
    let week_ago = Utc::now() - TimeDelta::days(7);

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let repository = Arc::clone(&repository);
            let draft = pending(machine, &format!("Draft {n}"), Priority::Medium);
            tokio::spawn(async move { repository.insert_numbered_unless_open(draft, week_ago).await })
        })
        .collect();
    let mut stored = 0;
    for handle in handles {
        if handle
            .await
            .expect("task completes")
            .expect("insert runs")
            .is_some()
        {
            stored += 1;
        }
    }

    assert_eq!(stored, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn counts_group_by_status_and_priority(repository: InMemoryWorkOrderRepository) {
    let machine = MachineId::new();
    for priority in [Priority::High, Priority::High, Priority::Low] {
        repository
            .insert_numbered(pending(machine, "Counted", priority))
            .await
            .expect("insert succeeds");
    }

    let counts = repository.status_counts().await.expect("counts succeed");

    assert_eq!(counts.total(), 3);
    assert_eq!(counts.status(WorkOrderStatus::Draft), 3);
    assert_eq!(counts.status(WorkOrderStatus::Closed), 0);
    assert_eq!(counts.priority(Priority::High), 2);
    assert_eq!(counts.priority(Priority::Urgent), 0);
}
