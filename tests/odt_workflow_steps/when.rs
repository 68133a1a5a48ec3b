//! When steps for work-order lifecycle BDD scenarios.

use super::world::{OdtWorld, run_async};
use odt_control::work_order::{
    domain::ExecutionDetailUpdate,
    services::{TransitionOutcome, WorkflowError},
};
use rstest_bdd_macros::when;

/// Stores the outcome and fails the step only on infrastructure errors.
fn record(
    world: &mut OdtWorld,
    result: Result<TransitionOutcome, WorkflowError>,
) -> Result<(), eyre::Report> {
    if let Err(ref err) = result
        && !matches!(err, WorkflowError::Unauthorized { .. })
    {
        return Err(eyre::eyre!("operation failed: {err}"));
    }
    world.last_result = Some(result);
    Ok(())
}

#[when(r#"the machine state changes to "{state}""#)]
fn machine_state_changes(world: &mut OdtWorld, state: String) -> Result<(), eyre::Report> {
    world.change_machine_state(&state)
}

#[when(r#""{actor}" submits the work order"#)]
fn submits_work_order(world: &mut OdtWorld, actor: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.submit_request(&by, id));
    record(world, result)
}

#[when(r#""{actor}" assigns the work order to "{assignee}""#)]
fn assigns_work_order(
    world: &mut OdtWorld,
    actor: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let responsible = world.actor(&assignee)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.assign_responsible(&by, id, responsible.id()));
    record(world, result)
}

#[when(r#""{actor}" starts execution"#)]
fn starts_execution(world: &mut OdtWorld, actor: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.start_execution(&by, id));
    record(world, result)
}

#[when(r#""{actor}" records the tasks "{tasks}""#)]
fn records_tasks(world: &mut OdtWorld, actor: String, tasks: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let update = ExecutionDetailUpdate {
        tasks_performed: Some(tasks),
        ..ExecutionDetailUpdate::default()
    };
    let result = run_async(world.workflow.record_execution_detail(&by, id, update));
    record(world, result)
}

#[when(r#""{actor}" submits the work order for review"#)]
fn submits_for_review(world: &mut OdtWorld, actor: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.submit_for_review(&by, id));
    record(world, result)
}

#[when(r#""{actor}" approves the review"#)]
fn approves_review(world: &mut OdtWorld, actor: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.review_approve(&by, id));
    record(world, result)
}

#[when(r#""{actor}" gives final approval"#)]
fn gives_final_approval(world: &mut OdtWorld, actor: String) -> Result<(), eyre::Report> {
    let by = world.actor(&actor)?;
    let id = world.work_order_id()?;
    let result = run_async(world.workflow.approve_final(&by, id));
    record(world, result)
}
