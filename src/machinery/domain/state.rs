//! Machine operational state and the trigger predicate.

use super::{MachineId, ParseMachineStateError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational state of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineState {
    /// Running normally.
    Operative,
    /// Needs maintenance soon.
    MaintenanceRequired,
    /// Currently being maintained.
    InMaintenance,
    /// Stopped because of a fault.
    OutOfService,
    /// Permanently retired.
    Decommissioned,
}

impl MachineState {
    /// Every machine state, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Operative,
        Self::MaintenanceRequired,
        Self::InMaintenance,
        Self::OutOfService,
        Self::Decommissioned,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operative => "OPERATIVE",
            Self::MaintenanceRequired => "MAINTENANCE_REQUIRED",
            Self::InMaintenance => "IN_MAINTENANCE",
            Self::OutOfService => "OUT_OF_SERVICE",
            Self::Decommissioned => "DECOMMISSIONED",
        }
    }

    /// Returns `true` for states whose entry raises a draft work order.
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::MaintenanceRequired | Self::OutOfService)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MachineState {
    type Error = ParseMachineStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| ParseMachineStateError(value.to_owned()))
    }
}

/// A committed change of a machine's operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineStateChange {
    machine_id: MachineId,
    previous: Option<MachineState>,
    current: MachineState,
    changed_at: DateTime<Utc>,
}

impl MachineStateChange {
    /// Creates a state change record. `previous` is `None` for a machine
    /// that did not exist before the write.
    #[must_use]
    pub const fn new(
        machine_id: MachineId,
        previous: Option<MachineState>,
        current: MachineState,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            machine_id,
            previous,
            current,
            changed_at,
        }
    }

    /// Returns the machine whose state changed.
    #[must_use]
    pub const fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    /// Returns the state before the write, if the machine existed.
    #[must_use]
    pub const fn previous(&self) -> Option<MachineState> {
        self.previous
    }

    /// Returns the state after the write.
    #[must_use]
    pub const fn current(&self) -> MachineState {
        self.current
    }

    /// Returns when the change was committed.
    #[must_use]
    pub const fn changed_at(&self) -> DateTime<Utc> {
        self.changed_at
    }

    /// Returns `true` when the change enters a trigger state from outside
    /// the trigger set.
    #[must_use]
    pub const fn needs_new_work_order(&self) -> bool {
        let was_trigger = match self.previous {
            Some(previous) => previous.is_trigger(),
            None => false,
        };
        !was_trigger && self.current.is_trigger()
    }
}
