//! Raises draft work orders when machines enter a trigger state.

use super::numbering::{DEFAULT_NUMBERING_RETRIES, retry_numbering};
use crate::machinery::{
    domain::{Machine, MachineStateChange},
    ports::{MachineStateObserver, ObserverError},
};
use crate::work_order::{
    domain::{PendingWorkOrder, Priority, WorkOrderDetails},
    ports::WorkOrderRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use minijinja::{Environment, context};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const OBSERVER_NAME: &str = "machine_state_tracker";

/// Default title of an automatic draft.
pub const DEFAULT_TITLE_TEMPLATE: &str = "Intervention for state change: {{ state }}";

/// Default description of an automatic draft.
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Work order raised automatically after machine \
{{ machine_name }} ({{ machine_code }}) changed state to {{ state }}.";

/// How automatic drafts are deduplicated and worded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDraftPolicy {
    dedup_window: TimeDelta,
    title_template: String,
    description_template: String,
    numbering_retries: u32,
}

impl Default for AutoDraftPolicy {
    fn default() -> Self {
        Self {
            dedup_window: TimeDelta::days(7),
            title_template: DEFAULT_TITLE_TEMPLATE.to_owned(),
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_owned(),
            numbering_retries: DEFAULT_NUMBERING_RETRIES,
        }
    }
}

impl AutoDraftPolicy {
    /// Sets the trailing window in which an open order suppresses a new
    /// draft.
    #[must_use]
    pub const fn with_dedup_window(mut self, window: TimeDelta) -> Self {
        self.dedup_window = window;
        self
    }

    /// Sets the `minijinja` templates for title and description. Both see
    /// `state`, `machine_name` and `machine_code`.
    #[must_use]
    pub fn with_templates(
        mut self,
        title_template: impl Into<String>,
        description_template: impl Into<String>,
    ) -> Self {
        self.title_template = title_template.into();
        self.description_template = description_template.into();
        self
    }

    /// Sets how often numbering collisions are retried.
    #[must_use]
    pub const fn with_numbering_retries(mut self, retries: u32) -> Self {
        self.numbering_retries = retries;
        self
    }

    /// Returns the deduplication window.
    #[must_use]
    pub const fn dedup_window(&self) -> TimeDelta {
        self.dedup_window
    }

    /// Renders title and description for `machine` entering its current
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`minijinja::Error`] when a template fails to render.
    pub fn render(&self, machine: &Machine) -> Result<(String, String), minijinja::Error> {
        let environment = Environment::new();
        let values = context! {
            state => machine.state().as_str(),
            machine_name => machine.name(),
            machine_code => machine.code().as_str(),
        };
        let title = environment.render_str(&self.title_template, &values)?;
        let description = environment.render_str(&self.description_template, &values)?;
        Ok((title, description))
    }
}

/// Machine state observer creating a draft work order on trigger changes.
///
/// A draft is only created when the machine has no open order created
/// within the deduplication window. The check and the insert are one
/// repository call, so overlapping trigger changes raise a single draft. Failures are reported to the machine
/// registry, which logs them without failing the machine update.
pub struct MachineStateTracker<W, C>
where
    W: WorkOrderRepository,
    C: Clock + Send + Sync,
{
    work_orders: Arc<W>,
    clock: Arc<C>,
    policy: AutoDraftPolicy,
}

impl<W, C> MachineStateTracker<W, C>
where
    W: WorkOrderRepository,
    C: Clock + Send + Sync,
{
    /// Creates a tracker using the default policy.
    #[must_use]
    pub fn new(work_orders: Arc<W>, clock: Arc<C>) -> Self {
        Self {
            work_orders,
            clock,
            policy: AutoDraftPolicy::default(),
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: AutoDraftPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl<W, C> MachineStateObserver for MachineStateTracker<W, C>
where
    W: WorkOrderRepository,
    C: Clock + Send + Sync,
{
    #[instrument(skip(self, machine, change), fields(machine_id = %machine.id(), state = %change.current()))]
    async fn on_state_changed(
        &self,
        machine: &Machine,
        change: &MachineStateChange,
    ) -> Result<(), ObserverError> {
        if !change.needs_new_work_order() {
            return Ok(());
        }

        let since = self
            .clock
            .utc()
            .checked_sub_signed(self.policy.dedup_window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let (title, description) = self
            .policy
            .render(machine)
            .map_err(|err| ObserverError::new(OBSERVER_NAME, err))?;
        let mut details = WorkOrderDetails::new(title, description)
            .map_err(|err| ObserverError::new(OBSERVER_NAME, err))?
            .with_priority(Priority::Medium);
        if let Some(machine_type) = machine.details().machine_type() {
            details = details.with_machine_type(machine_type);
        }

        let pending =
            PendingWorkOrder::new(machine.id(), details, machine.responsible(), &*self.clock);
        let work_orders = &*self.work_orders;
        let drafted = retry_numbering(&pending, self.policy.numbering_retries, move |attempt| {
            work_orders.insert_numbered_unless_open(attempt, since)
        })
        .await
        .map_err(|err| ObserverError::new(OBSERVER_NAME, err))?;
        let Some(order) = drafted else {
            debug!("open work order already exists, skipping automatic draft");
            return Ok(());
        };
        info!(
            work_order_id = %order.id(),
            correlative = %order.numbers().correlative(),
            "automatic work order drafted"
        );
        Ok(())
    }
}
