//! Identifier and validated scalar types for the machinery domain.

use super::MachineDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
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

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a machine.
    MachineId
);

uuid_id!(
    /// Unique identifier for a machine type (line of work).
    MachineTypeId
);

/// Plate, serial or inventory code identifying a machine.
///
/// Codes are trimmed and must be globally unique; uniqueness is enforced by
/// the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineCode(String);

impl MachineCode {
    /// Maximum code length accepted by storage.
    pub const MAX_LENGTH: usize = 100;

    /// Creates a validated machine code.
    ///
    /// # Errors
    ///
    /// Returns [`MachineDomainError`] when the code is blank, contains
    /// whitespace or exceeds [`Self::MAX_LENGTH`] characters.
    pub fn new(value: impl AsRef<str>) -> Result<Self, MachineDomainError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MachineDomainError::EmptyCode);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(MachineDomainError::InvalidCode(trimmed.to_owned()));
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(MachineDomainError::CodeTooLong {
                code: trimmed.to_owned(),
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MachineCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MachineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
