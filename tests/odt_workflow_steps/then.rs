//! Then steps for work-order lifecycle BDD scenarios.

use super::world::{OdtWorld, run_async};
use odt_control::{
    machinery::domain::MachineState,
    work_order::{
        domain::WorkOrderStatus,
        ports::{WorkOrderFilter, WorkOrderRepository},
        services::{TransitionOutcome, WorkflowError},
    },
};
use rstest_bdd_macros::then;

#[then("the machine has {count:usize} work order")]
fn machine_has_work_orders(world: &OdtWorld, count: usize) -> Result<(), eyre::Report> {
    let machine = world.machine()?.id();
    let orders = run_async(world.work_orders.list(&WorkOrderFilter {
        machine: Some(machine),
        ..WorkOrderFilter::default()
    }))?;
    eyre::ensure!(
        orders.len() == count,
        "expected {count} work orders, found {}",
        orders.len()
    );
    Ok(())
}

#[then(r#"the work order title contains "{text}""#)]
fn title_contains(world: &OdtWorld, text: String) -> Result<(), eyre::Report> {
    let order = world.work_order()?;
    eyre::ensure!(
        order.title().contains(&text),
        "title {:?} does not contain {text:?}",
        order.title()
    );
    Ok(())
}

#[then(r#"the work order status is "{status}""#)]
fn status_is(world: &OdtWorld, status: String) -> Result<(), eyre::Report> {
    let expected = WorkOrderStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let order = world.work_order()?;
    eyre::ensure!(
        order.status() == expected,
        "expected status {expected}, found {}",
        order.status()
    );
    Ok(())
}

#[then(r#"the machine state is "{state}""#)]
fn machine_state_is(world: &OdtWorld, state: String) -> Result<(), eyre::Report> {
    let expected = MachineState::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected state in scenario: {err}"))?;
    let id = world.machine()?.id();
    let machine = run_async(world.registry.find_by_id(id))?
        .ok_or_else(|| eyre::eyre!("machine vanished"))?;
    eyre::ensure!(
        machine.state() == expected,
        "expected machine state {expected}, found {}",
        machine.state()
    );
    Ok(())
}

#[then("the last operation was not eligible")]
fn last_operation_not_eligible(world: &OdtWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    if !matches!(result, Ok(TransitionOutcome::NotEligible { .. })) {
        return Err(eyre::eyre!("expected a not-eligible outcome, got {result:?}"));
    }
    Ok(())
}

#[then("the last operation was refused")]
fn last_operation_refused(world: &OdtWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing operation result"))?;
    if !matches!(result, Err(WorkflowError::Unauthorized { .. })) {
        return Err(eyre::eyre!("expected an authorization refusal, got {result:?}"));
    }
    Ok(())
}
