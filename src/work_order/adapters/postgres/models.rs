//! Diesel row models for work-order persistence.

use super::schema::work_orders;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::BigInt;

/// Row model for work-order records, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = work_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkOrderRow {
    /// Internal identifier.
    pub id: uuid::Uuid,
    /// Correlative number.
    pub correlative: i64,
    /// Display number.
    pub odt_number: i64,
    /// Owning machine.
    pub machine_id: uuid::Uuid,
    /// Machine type.
    pub machine_type_id: Option<uuid::Uuid>,
    /// Title.
    pub title: String,
    /// Work description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Work type.
    pub work_type: String,
    /// Creator.
    pub creator_id: Option<uuid::Uuid>,
    /// Reviewer.
    pub reviewer_id: Option<uuid::Uuid>,
    /// Final approver.
    pub approver_id: Option<uuid::Uuid>,
    /// Execution responsible.
    pub responsible_id: Option<uuid::Uuid>,
    /// Authorizer.
    pub authorizer_id: Option<uuid::Uuid>,
    /// Scheduled start.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Execution start.
    pub started_at: Option<DateTime<Utc>>,
    /// Execution end.
    pub ended_at: Option<DateTime<Utc>>,
    /// Report file path.
    pub report_file: Option<String>,
    /// Execution detail document.
    pub execution_detail: Option<serde_json::Value>,
    /// Spare part lines.
    pub spare_parts: serde_json::Value,
    /// Personnel-hours lines.
    pub personnel_hours: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Mutable columns written by updates. Numbers and identity never change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = work_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct WorkOrderChangeset {
    /// Machine type.
    pub machine_type_id: Option<uuid::Uuid>,
    /// Title.
    pub title: String,
    /// Work description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Work type.
    pub work_type: String,
    /// Creator.
    pub creator_id: Option<uuid::Uuid>,
    /// Reviewer.
    pub reviewer_id: Option<uuid::Uuid>,
    /// Final approver.
    pub approver_id: Option<uuid::Uuid>,
    /// Execution responsible.
    pub responsible_id: Option<uuid::Uuid>,
    /// Authorizer.
    pub authorizer_id: Option<uuid::Uuid>,
    /// Scheduled start.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Execution start.
    pub started_at: Option<DateTime<Utc>>,
    /// Execution end.
    pub ended_at: Option<DateTime<Utc>>,
    /// Report file path.
    pub report_file: Option<String>,
    /// Execution detail document.
    pub execution_detail: Option<serde_json::Value>,
    /// Spare part lines.
    pub spare_parts: serde_json::Value,
    /// Personnel-hours lines.
    pub personnel_hours: serde_json::Value,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Numbers handed out by the counter row.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct AllocatedNumbers {
    /// Allocated correlative.
    #[diesel(sql_type = BigInt)]
    pub correlative: i64,
    /// Allocated display number.
    #[diesel(sql_type = BigInt)]
    pub odt_number: i64,
}

/// Bumps the single counter row past both the stored counters and the
/// current table maxima. The row lock serializes concurrent allocators.
pub const ALLOCATE_NUMBERS_SQL: &str = "\
UPDATE work_order_counters SET \
    last_correlative = GREATEST(last_correlative, \
        (SELECT COALESCE(MAX(correlative), 0) FROM work_orders)) + 1, \
    last_odt_number = GREATEST(last_odt_number, \
        (SELECT COALESCE(MAX(odt_number), 0) FROM work_orders)) + 1 \
WHERE id = 1 \
RETURNING last_correlative AS correlative, last_odt_number AS odt_number";

/// Locks the machine row for the rest of the transaction so that
/// automatic drafts for one machine are decided one at a time.
pub const LOCK_MACHINE_SQL: &str = "SELECT id FROM machines WHERE id = $1 FOR UPDATE";
