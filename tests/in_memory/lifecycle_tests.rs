//! End-to-end approval flow over in-memory adapters.

use super::helpers::{Plant, applied, plant};
use odt_control::{
    machinery::domain::MachineState,
    work_order::{
        domain::WorkOrderStatus,
        services::{TransitionOutcome, WorkflowError},
    },
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn breakdown_is_drafted_executed_and_approved(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("EX-200").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;

    let drafts = plant.orders_for(&machine).await?;
    eyre::ensure!(drafts.len() == 1, "expected one draft, found {}", drafts.len());
    let draft = &drafts[0];
    eyre::ensure!(
        draft.title().contains("MAINTENANCE"),
        "unexpected title {}",
        draft.title()
    );
    eyre::ensure!(draft.creator() == Some(plant.staff.operator.id()));

    let in_review = plant.into_review(draft.id()).await?;
    let detail = in_review
        .execution_detail()
        .ok_or_else(|| eyre::eyre!("execution detail missing"))?;
    eyre::ensure!(detail.is_signed(), "detail must be signed on hand-in");

    let staff = &plant.staff;
    applied(plant.workflow.review_approve(&staff.supervisor, draft.id()).await?)?;
    let approved = applied(plant.workflow.approve_final(&staff.manager, draft.id()).await?)?;
    eyre::ensure!(approved.status() == WorkOrderStatus::Approved);
    eyre::ensure!(approved.reviewer() == Some(staff.supervisor.id()));
    eyre::ensure!(approved.approver() == Some(staff.manager.id()));

    let current = plant
        .registry
        .find_by_id(machine.id())
        .await?
        .ok_or_else(|| eyre::eyre!("machine vanished"))?;
    eyre::ensure!(current.state() == MachineState::InMaintenance);

    // Entering maintenance is not a trigger, so no second draft appears.
    eyre::ensure!(plant.orders_for(&machine).await?.len() == 1);

    let closed = applied(plant.workflow.close(&staff.manager, draft.id()).await?)?;
    eyre::ensure!(closed.status() == WorkOrderStatus::Closed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn approval_without_review_is_refused_and_leaves_machine(
    plant: Plant,
) -> Result<(), eyre::Report> {
    let machine = plant.machine("EX-201").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::OutOfService)
        .await?;
    let draft_id = plant.orders_for(&machine).await?[0].id();
    plant.into_review(draft_id).await?;

    let outcome = plant
        .workflow
        .approve_final(&plant.staff.manager, draft_id)
        .await?;

    eyre::ensure!(
        outcome
            == TransitionOutcome::NotEligible {
                id: draft_id,
                operation: "approve_final",
                status: WorkOrderStatus::InReview,
            },
        "unexpected outcome {outcome:?}"
    );
    let current = plant
        .registry
        .find_by_id(machine.id())
        .await?
        .ok_or_else(|| eyre::eyre!("machine vanished"))?;
    eyre::ensure!(current.state() == MachineState::OutOfService);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_operations_are_idempotent(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("EX-202").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;
    let id = plant.orders_for(&machine).await?[0].id();
    let staff = &plant.staff;

    let first = plant.workflow.submit_request(&staff.operator, id).await?;
    let second = plant.workflow.submit_request(&staff.operator, id).await?;

    eyre::ensure!(first.is_applied());
    eyre::ensure!(!second.is_applied());
    let stored = plant
        .workflow
        .find(&staff.manager, id)
        .await?
        .ok_or_else(|| eyre::eyre!("order vanished"))?;
    eyre::ensure!(first.applied().as_ref() == Some(&stored));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unauthorized_actor_changes_nothing(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("EX-203").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;
    let id = plant.orders_for(&machine).await?[0].id();
    plant.into_review(id).await?;

    let result = plant
        .workflow
        .review_approve(&plant.staff.technician, id)
        .await;

    eyre::ensure!(
        matches!(
            result,
            Err(WorkflowError::Unauthorized {
                operation: "review_approve",
                ..
            })
        ),
        "expected refusal, got {result:?}"
    );
    let stored = plant
        .workflow
        .find(&plant.staff.manager, id)
        .await?
        .ok_or_else(|| eyre::eyre!("order vanished"))?;
    eyre::ensure!(stored.reviewer().is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn inbox_tracks_the_order_through_its_life(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("EX-204").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;
    let id = plant.orders_for(&machine).await?[0].id();
    let staff = &plant.staff;

    eyre::ensure!(plant.queries.inbox(&staff.operator).await?.my_drafts.len() == 1);
    plant.into_review(id).await?;
    eyre::ensure!(plant.queries.inbox(&staff.supervisor).await?.to_review.len() == 1);
    eyre::ensure!(plant.queries.inbox(&staff.manager).await?.to_approve.is_empty());

    applied(plant.workflow.review_approve(&staff.supervisor, id).await?)?;

    eyre::ensure!(plant.queries.inbox(&staff.supervisor).await?.to_review.is_empty());
    eyre::ensure!(plant.queries.inbox(&staff.manager).await?.to_approve.len() == 1);
    Ok(())
}
