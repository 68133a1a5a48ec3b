//! In-memory role directory.

mod directory;

pub use directory::{DirectoryLockError, RoleDirectory};
