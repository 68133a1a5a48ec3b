//! Error types for access domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing access domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessDomainError {
    /// The role name is empty after trimming.
    #[error("role name must not be empty")]
    EmptyRoleName,
}

/// Error returned while parsing capabilities from external input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability: {0}")]
pub struct ParseCapabilityError(pub String);
