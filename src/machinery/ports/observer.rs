//! Post-commit hook for machine state changes.

use crate::machinery::domain::{Machine, MachineStateChange};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Receives every committed machine state change.
///
/// Observers run after the machine write has been persisted. Their failures
/// are logged by the registry service and never undo or fail the write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MachineStateObserver: Send + Sync {
    /// Reacts to a committed state change of `machine`.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError`] when the reaction could not be completed.
    async fn on_state_changed(
        &self,
        machine: &Machine,
        change: &MachineStateChange,
    ) -> Result<(), ObserverError>;
}

/// Failure reported by a state observer.
#[derive(Debug, Clone, Error)]
#[error("{observer} failed: {source}")]
pub struct ObserverError {
    observer: &'static str,
    #[source]
    source: Arc<dyn std::error::Error + Send + Sync>,
}

impl ObserverError {
    /// Wraps a failure raised by the named observer.
    pub fn new(
        observer: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            observer,
            source: Arc::new(source),
        }
    }

    /// Returns the name of the failing observer.
    #[must_use]
    pub const fn observer(&self) -> &'static str {
        self.observer
    }
}
