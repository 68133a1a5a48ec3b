//! Automatic drafts raised by machine state changes.

use super::helpers::{Plant, applied, plant};
use odt_control::machinery::domain::MachineState;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn flapping_machine_gets_one_draft(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("AD-01").await?;
    for state in [
        MachineState::MaintenanceRequired,
        MachineState::Operative,
        MachineState::OutOfService,
        MachineState::Operative,
        MachineState::MaintenanceRequired,
    ] {
        plant.registry.change_state(machine.id(), state).await?;
    }

    eyre::ensure!(plant.orders_for(&machine).await?.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submitted_request_does_not_block_a_new_draft(plant: Plant) -> Result<(), eyre::Report> {
    let machine = plant.machine("AD-02").await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::MaintenanceRequired)
        .await?;
    let first = plant.orders_for(&machine).await?[0].id();
    applied(
        plant
            .workflow
            .submit_request(&plant.staff.operator, first)
            .await?,
    )?;

    plant
        .registry
        .change_state(machine.id(), MachineState::Operative)
        .await?;
    plant
        .registry
        .change_state(machine.id(), MachineState::OutOfService)
        .await?;

    eyre::ensure!(plant.orders_for(&machine).await?.len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn drafts_for_different_machines_are_independent(plant: Plant) -> Result<(), eyre::Report> {
    let press = plant.machine("AD-03").await?;
    let lathe = plant.machine("AD-04").await?;

    for machine in [&press, &lathe] {
        plant
            .registry
            .change_state(machine.id(), MachineState::OutOfService)
            .await?;
    }

    let press_orders = plant.orders_for(&press).await?;
    let lathe_orders = plant.orders_for(&lathe).await?;
    eyre::ensure!(press_orders.len() == 1 && lathe_orders.len() == 1);
    eyre::ensure!(
        press_orders[0].numbers().correlative() != lathe_orders[0].numbers().correlative()
    );
    Ok(())
}
