//! Execution detail and line items recorded while a work order is carried
//! out.

use super::{ParseWorkOrderFieldError, WorkOrderDomainError, status::parse_upper};
use crate::access::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of the failure being repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCategory {
    /// Mechanical failure.
    Mechanical,
    /// Electrical failure.
    Electrical,
    /// Overheating or other thermal failure.
    Thermal,
    /// Hydraulic failure.
    Hydraulic,
    /// Pneumatic failure.
    Pneumatic,
    /// Anything else.
    #[default]
    Other,
}

impl FailureCategory {
    /// Every failure category.
    pub const ALL: [Self; 6] = [
        Self::Mechanical,
        Self::Electrical,
        Self::Thermal,
        Self::Hydraulic,
        Self::Pneumatic,
        Self::Other,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mechanical => "MECHANICAL",
            Self::Electrical => "ELECTRICAL",
            Self::Thermal => "THERMAL",
            Self::Hydraulic => "HYDRAULIC",
            Self::Pneumatic => "PNEUMATIC",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FailureCategory {
    type Error = ParseWorkOrderFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_upper(value, &Self::ALL, Self::as_str, "failure category")
    }
}

/// Execution log attached to a work order once work begins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionDetail {
    failure_description: Option<String>,
    failure_category: FailureCategory,
    work_started_at: Option<DateTime<Utc>>,
    work_ended_at: Option<DateTime<Utc>>,
    tasks_performed: Option<String>,
    safety_measures: Option<String>,
    observations: Option<String>,
    executor: Option<UserId>,
    signed_at: Option<DateTime<Utc>>,
}

impl ExecutionDetail {
    /// Creates an empty execution detail executed by `executor`.
    #[must_use]
    pub fn new(executor: Option<UserId>) -> Self {
        Self {
            executor,
            ..Self::default()
        }
    }

    /// Returns the failure description, if any.
    #[must_use]
    pub fn failure_description(&self) -> Option<&str> {
        self.failure_description.as_deref()
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn failure_category(&self) -> FailureCategory {
        self.failure_category
    }

    /// Returns when hands-on work started, if recorded.
    #[must_use]
    pub const fn work_started_at(&self) -> Option<DateTime<Utc>> {
        self.work_started_at
    }

    /// Returns when hands-on work ended, if recorded.
    #[must_use]
    pub const fn work_ended_at(&self) -> Option<DateTime<Utc>> {
        self.work_ended_at
    }

    /// Returns the tasks performed, if any.
    #[must_use]
    pub fn tasks_performed(&self) -> Option<&str> {
        self.tasks_performed.as_deref()
    }

    /// Returns the safety measures taken, if any.
    #[must_use]
    pub fn safety_measures(&self) -> Option<&str> {
        self.safety_measures.as_deref()
    }

    /// Returns free-text observations, if any.
    #[must_use]
    pub fn observations(&self) -> Option<&str> {
        self.observations.as_deref()
    }

    /// Returns who executed the work, if known.
    #[must_use]
    pub const fn executor(&self) -> Option<UserId> {
        self.executor
    }

    /// Returns when the detail was signed off, if it has been.
    #[must_use]
    pub const fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.signed_at
    }

    /// Returns `true` once the detail has been signed off.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }

    /// Applies the fields present in `update`.
    pub fn apply(&mut self, update: ExecutionDetailUpdate) {
        let ExecutionDetailUpdate {
            failure_description,
            failure_category,
            work_started_at,
            work_ended_at,
            tasks_performed,
            safety_measures,
            observations,
            executor,
        } = update;

        replace_text(&mut self.failure_description, failure_description);
        replace_text(&mut self.tasks_performed, tasks_performed);
        replace_text(&mut self.safety_measures, safety_measures);
        replace_text(&mut self.observations, observations);
        if let Some(category) = failure_category {
            self.failure_category = category;
        }
        if work_started_at.is_some() {
            self.work_started_at = work_started_at;
        }
        if work_ended_at.is_some() {
            self.work_ended_at = work_ended_at;
        }
        if executor.is_some() {
            self.executor = executor;
        }
    }

    /// Signs the detail off. The first signature wins.
    pub fn sign(&mut self, clock: &impl Clock) {
        if self.signed_at.is_none() {
            self.signed_at = Some(clock.utc());
        }
    }
}

/// Blank text clears the field; `None` leaves it alone.
fn replace_text(field: &mut Option<String>, value: Option<String>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        *field = (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }
}

/// Partial update of an [`ExecutionDetail`]. Unset fields are left as they
/// are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionDetailUpdate {
    /// New failure description.
    pub failure_description: Option<String>,
    /// New failure category.
    pub failure_category: Option<FailureCategory>,
    /// When hands-on work started.
    pub work_started_at: Option<DateTime<Utc>>,
    /// When hands-on work ended.
    pub work_ended_at: Option<DateTime<Utc>>,
    /// Tasks performed.
    pub tasks_performed: Option<String>,
    /// Safety measures taken.
    pub safety_measures: Option<String>,
    /// Free-text observations.
    pub observations: Option<String>,
    /// Who executed the work.
    pub executor: Option<UserId>,
}

/// A spare part consumed by a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparePartUsage {
    code: Option<String>,
    description: String,
    quantity: Decimal,
}

impl SparePartUsage {
    /// Creates a validated spare part line.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderDomainError::EmptySparePart`] for a blank
    /// description and [`WorkOrderDomainError::NegativeQuantity`] for a
    /// negative quantity.
    pub fn new(
        code: Option<&str>,
        description: &str,
        quantity: Decimal,
    ) -> Result<Self, WorkOrderDomainError> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(WorkOrderDomainError::EmptySparePart);
        }
        if quantity < Decimal::ZERO {
            return Err(WorkOrderDomainError::NegativeQuantity(quantity));
        }
        Ok(Self {
            code: non_blank(code),
            description: trimmed.to_owned(),
            quantity,
        })
    }

    /// Returns the part code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the part description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the quantity used.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }
}

/// Labour logged against a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelHours {
    category: Option<String>,
    worker: Option<String>,
    hours: Decimal,
}

impl PersonnelHours {
    /// Creates a validated personnel-hours line.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderDomainError::EmptyPersonnelEntry`] when both
    /// category and worker are blank and
    /// [`WorkOrderDomainError::NegativeHours`] for negative hours.
    pub fn new(
        category: Option<&str>,
        worker: Option<&str>,
        hours: Decimal,
    ) -> Result<Self, WorkOrderDomainError> {
        let category_text = non_blank(category);
        let worker_text = non_blank(worker);
        if category_text.is_none() && worker_text.is_none() {
            return Err(WorkOrderDomainError::EmptyPersonnelEntry);
        }
        if hours < Decimal::ZERO {
            return Err(WorkOrderDomainError::NegativeHours(hours));
        }
        Ok(Self {
            category: category_text,
            worker: worker_text,
            hours,
        })
    }

    /// Returns the trade or category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the worker's name, if any.
    #[must_use]
    pub fn worker(&self) -> Option<&str> {
        self.worker.as_deref()
    }

    /// Returns the hours worked.
    #[must_use]
    pub const fn hours(&self) -> Decimal {
        self.hours
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}
