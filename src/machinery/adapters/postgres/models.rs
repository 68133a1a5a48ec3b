//! Diesel row models for machinery persistence.

use super::schema::{machine_types, machines};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for machine records, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = machines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MachineRow {
    /// Internal machine identifier.
    pub id: uuid::Uuid,
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Operational state.
    pub state: String,
    /// Responsible person.
    pub responsible_id: Option<uuid::Uuid>,
    /// Machine type.
    pub machine_type_id: Option<uuid::Uuid>,
    /// Active flag.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Descriptive columns written by detail and activation updates.
///
/// The operational state is left out; it only changes through the
/// conditional state update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = machines)]
#[diesel(treat_none_as_null = true)]
pub struct MachineChangeset {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Responsible person.
    pub responsible_id: Option<uuid::Uuid>,
    /// Machine type.
    pub machine_type_id: Option<uuid::Uuid>,
    /// Active flag.
    pub active: bool,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for machine type records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = machine_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MachineTypeRow {
    /// Internal machine type identifier.
    pub id: uuid::Uuid,
    /// Unique name.
    pub name: String,
    /// Active flag.
    pub active: bool,
}
