//! Racing callers against shared in-memory state.

use std::sync::Arc;

use super::delayed::{ChangeLog, SlowDrafts, StaleLookups};
use super::helpers::{Plant, plant};
use mockable::DefaultClock;
use odt_control::{
    access::domain::{Actor, Capability, UserId},
    machinery::{
        adapters::memory::InMemoryMachineRepository,
        domain::MachineState,
        services::{MachineRegistryService, RegisterMachineRequest, UpdateMachineRequest},
    },
    work_order::{
        ports::{WorkOrderFilter, WorkOrderRepository},
        services::{CreateWorkOrderRequest, MachineStateTracker},
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reviews_sign_off_once(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("CC-01").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;
    let id = plant.orders_for(&machine).await?[0].id();
    plant.into_review(id).await?;

    let mut reviewers = Vec::new();
    for n in 0..8 {
        let reviewer = Actor::new(UserId::new(), format!("Reviewer {n}"));
        plant.directory.grant(reviewer.id(), Capability::ReviewOdt)?;
        reviewers.push(reviewer);
    }
    let handles: Vec<_> = reviewers
        .into_iter()
        .map(|reviewer| {
            let workflow = Arc::clone(&plant.workflow);
            tokio::spawn(async move { workflow.review_approve(&reviewer, id).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        if handle.await??.is_applied() {
            applied += 1;
        }
    }

    eyre::ensure!(applied == 1, "expected exactly one sign-off, got {applied}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_creation_numbers_are_unique(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("CC-02").await?;
    let handles: Vec<_> = (0..12)
        .map(|n| {
            let workflow = Arc::clone(&plant.workflow);
            let operator = plant.staff.operator.clone();
            let request =
                CreateWorkOrderRequest::new(machine.id(), format!("Inspection {n}"), "");
            tokio::spawn(async move { workflow.create(&operator, request).await })
        })
        .collect();

    let mut correlatives = Vec::new();
    let mut odt_numbers = Vec::new();
    for handle in handles {
        let order = handle.await??;
        correlatives.push(order.numbers().correlative().value());
        odt_numbers.push(order.numbers().odt_number().value());
    }
    correlatives.sort_unstable();
    odt_numbers.sort_unstable();

    let expected: Vec<u64> = (1..=12).collect();
    eyre::ensure!(correlatives == expected, "correlatives {correlatives:?}");
    eyre::ensure!(odt_numbers == expected, "ODT numbers {odt_numbers:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlapping_trigger_changes_raise_one_draft() -> Result<(), eyre::Report> {
    let drafts = Arc::new(SlowDrafts::default());
    let tracker = MachineStateTracker::new(Arc::clone(&drafts), Arc::new(DefaultClock));
    let registry = Arc::new(
        MachineRegistryService::new(
            Arc::new(InMemoryMachineRepository::new()),
            Arc::new(DefaultClock),
        )
        .with_observer(Arc::new(tracker)),
    );
    let id = registry
        .register(RegisterMachineRequest::new("CC-03", "Crusher 3"))
        .await?
        .id();

    let breakdown = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .change_state(id, MachineState::MaintenanceRequired)
                .await
        })
    };
    drafts.entered.notified().await;
    registry.change_state(id, MachineState::Operative).await?;
    registry.change_state(id, MachineState::OutOfService).await?;
    breakdown.await??;

    let orders = drafts
        .inner
        .list(&WorkOrderFilter {
            machine: Some(id),
            ..WorkOrderFilter::default()
        })
        .await?;
    eyre::ensure!(
        orders.len() == 1,
        "expected one draft within the window, got {}",
        orders.len()
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detail_update_does_not_undo_a_concurrent_state_change() -> Result<(), eyre::Report> {
    let machines = Arc::new(StaleLookups::default());
    let registry = Arc::new(MachineRegistryService::new(
        Arc::clone(&machines),
        Arc::new(DefaultClock),
    ));
    let id = registry
        .register(RegisterMachineRequest::new("CC-04", "Crusher 4"))
        .await?
        .id();

    machines.hold_next_lookup();
    let rename = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .update_details(id, UpdateMachineRequest::new("Crusher 4 (rebuilt)"))
                .await
        })
    };
    machines.holding.notified().await;
    registry.change_state(id, MachineState::InMaintenance).await?;
    let renamed = rename.await??;

    let stored = registry
        .find_by_id(id)
        .await?
        .ok_or_else(|| eyre::eyre!("machine {id} disappeared"))?;
    eyre::ensure!(
        stored.state() == MachineState::InMaintenance,
        "state reverted to {}",
        stored.state()
    );
    eyre::ensure!(stored.name() == "Crusher 4 (rebuilt)", "rename lost");
    eyre::ensure!(renamed == stored, "update returned a stale machine");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_state_changes_report_the_state_they_replaced() -> Result<(), eyre::Report> {
    let machines = Arc::new(StaleLookups::default());
    let log = Arc::new(ChangeLog::default());
    let registry = Arc::new(
        MachineRegistryService::new(Arc::clone(&machines), Arc::new(DefaultClock))
            .with_observer(Arc::clone(&log) as _),
    );
    let id = registry
        .register(RegisterMachineRequest::new("CC-05", "Crusher 5"))
        .await?
        .id();

    machines.hold_next_lookup();
    let slow = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .change_state(id, MachineState::MaintenanceRequired)
                .await
        })
    };
    machines.holding.notified().await;
    registry.change_state(id, MachineState::OutOfService).await?;
    let settled = slow.await??;

    eyre::ensure!(
        settled.state() == MachineState::MaintenanceRequired,
        "unexpected final state {}",
        settled.state()
    );
    let expected = vec![
        (None, MachineState::Operative),
        (Some(MachineState::Operative), MachineState::OutOfService),
        (
            Some(MachineState::OutOfService),
            MachineState::MaintenanceRequired,
        ),
    ];
    let seen = log.transitions();
    eyre::ensure!(seen == expected, "observed {seen:?}");
    Ok(())
}
