//! Identifier and sequential number types for the work-order domain.

use super::WorkOrderDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(Uuid);

impl WorkOrderId {
    /// Creates a new random work-order identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a work-order identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for WorkOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Largest number representable in the `PostgreSQL` schema.
const MAX_PERSISTED_NUMBER: u64 = i64::MAX as u64;

macro_rules! sequential_number {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The first number handed out.
            pub const FIRST: Self = Self(1);

            /// Creates a validated number.
            ///
            /// # Errors
            ///
            /// Returns [`WorkOrderDomainError::InvalidNumber`] when the value
            /// is zero or exceeds `i64::MAX`.
            pub const fn new(value: u64) -> Result<Self, WorkOrderDomainError> {
                if value == 0 || value > MAX_PERSISTED_NUMBER {
                    return Err(WorkOrderDomainError::InvalidNumber(value));
                }
                Ok(Self(value))
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }

            /// Returns the number following this one.
            ///
            /// # Errors
            ///
            /// Returns [`WorkOrderDomainError::InvalidNumber`] once the
            /// storage range is exhausted.
            pub const fn next(self) -> Result<Self, WorkOrderDomainError> {
                match self.0.checked_add(1) {
                    Some(value) => Self::new(value),
                    None => Err(WorkOrderDomainError::InvalidNumber(self.0)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequential_number!(
    /// Internal correlative number of a work order.
    Correlative
);

sequential_number!(
    /// Display number ("N° ODT") printed on work-order documents.
    OdtNumber
);

/// The pair of sequential numbers assigned to a work order on first
/// persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkOrderNumbers {
    correlative: Correlative,
    odt_number: OdtNumber,
}

impl WorkOrderNumbers {
    /// Pairs already-allocated numbers, as read back from storage.
    #[must_use]
    pub const fn new(correlative: Correlative, odt_number: OdtNumber) -> Self {
        Self {
            correlative,
            odt_number,
        }
    }

    /// Numbers for the very first work order.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(Correlative::FIRST, OdtNumber::FIRST)
    }

    /// Numbers following the current maxima. Each sequence starts at 1 when
    /// no maximum exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderDomainError::InvalidNumber`] once a sequence is
    /// exhausted.
    pub fn after(
        max_correlative: Option<Correlative>,
        max_odt_number: Option<OdtNumber>,
    ) -> Result<Self, WorkOrderDomainError> {
        let correlative = max_correlative.map_or(Ok(Correlative::FIRST), Correlative::next)?;
        let odt_number = max_odt_number.map_or(Ok(OdtNumber::FIRST), OdtNumber::next)?;
        Ok(Self::new(correlative, odt_number))
    }

    /// Returns the correlative number.
    #[must_use]
    pub const fn correlative(&self) -> Correlative {
        self.correlative
    }

    /// Returns the display number.
    #[must_use]
    pub const fn odt_number(&self) -> OdtNumber {
        self.odt_number
    }
}
