//! Given steps for work-order lifecycle BDD scenarios.

use super::world::{OdtWorld, run_async};
use eyre::WrapErr;
use odt_control::{
    machinery::services::RegisterMachineRequest, work_order::domain::ExecutionDetailUpdate,
};
use rstest_bdd_macros::given;

#[given(r#"a machine "{code}" the operator is responsible for"#)]
fn machine_with_operator(world: &mut OdtWorld, code: String) -> Result<(), eyre::Report> {
    let operator = world.actor("operator")?;
    let request = RegisterMachineRequest::new(code.clone(), format!("Machine {code}"))
        .with_responsible(operator.id());
    let machine = run_async(world.registry.register(request)).wrap_err("register machine")?;
    world.machine = Some(machine);
    Ok(())
}

#[given(r#"the machine state changes to "{state}""#)]
fn machine_state_changed(world: &mut OdtWorld, state: String) -> Result<(), eyre::Report> {
    world.change_machine_state(&state)
}

#[given("the work order has been taken into review")]
fn work_order_in_review(world: &mut OdtWorld) -> Result<(), eyre::Report> {
    let id = world.work_order_id()?;
    let operator = world.actor("operator")?;
    let supervisor = world.actor("supervisor")?;
    let technician = world.actor("technician")?;
    let workflow = &world.workflow;

    let submitted = run_async(workflow.submit_request(&operator, id)).wrap_err("submit")?;
    eyre::ensure!(submitted.is_applied(), "submit_request was not eligible");
    let assigned = run_async(workflow.assign_responsible(&supervisor, id, technician.id()))
        .wrap_err("assign")?;
    eyre::ensure!(assigned.is_applied(), "assign_responsible was not eligible");
    let started = run_async(workflow.start_execution(&technician, id)).wrap_err("start")?;
    eyre::ensure!(started.is_applied(), "start_execution was not eligible");
    let recorded = run_async(workflow.record_execution_detail(
        &technician,
        id,
        ExecutionDetailUpdate {
            tasks_performed: Some("Inspected and repaired".to_owned()),
            ..ExecutionDetailUpdate::default()
        },
    ))
    .wrap_err("record execution detail")?;
    eyre::ensure!(recorded.is_applied(), "record_execution_detail was not eligible");
    let handed_in =
        run_async(workflow.submit_for_review(&technician, id)).wrap_err("submit for review")?;
    eyre::ensure!(handed_in.is_applied(), "submit_for_review was not eligible");
    Ok(())
}
