//! Error types for machinery domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing machinery domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineDomainError {
    /// The machine code is empty after trimming.
    #[error("machine code must not be empty")]
    EmptyCode,

    /// The machine code contains whitespace.
    #[error("machine code '{0}' must not contain whitespace")]
    InvalidCode(String),

    /// The machine code exceeds the storage limit.
    #[error("machine code exceeds {max} character limit: {code}")]
    CodeTooLong {
        /// Offending code.
        code: String,
        /// Maximum accepted length.
        max: usize,
    },

    /// The machine name is empty after trimming.
    #[error("machine name must not be empty")]
    EmptyName,

    /// The machine type name is empty after trimming.
    #[error("machine type name must not be empty")]
    EmptyTypeName,
}

/// Error returned while parsing machine states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown machine state: {0}")]
pub struct ParseMachineStateError(pub String);
