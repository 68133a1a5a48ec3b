//! Diesel schema for work-order persistence.

diesel::table! {
    /// Work order (ODT) records.
    work_orders (id) {
        /// Internal work order identifier.
        id -> Uuid,
        /// Unique correlative number.
        correlative -> Int8,
        /// Unique display number.
        odt_number -> Int8,
        /// Owning machine.
        machine_id -> Uuid,
        /// Machine type (line of work).
        machine_type_id -> Nullable<Uuid>,
        /// Title.
        #[max_length = 200]
        title -> Varchar,
        /// Work description.
        description -> Text,
        /// Lifecycle status.
        #[max_length = 32]
        status -> Varchar,
        /// Priority.
        #[max_length = 16]
        priority -> Varchar,
        /// Work type.
        #[max_length = 16]
        work_type -> Varchar,
        /// Creator.
        creator_id -> Nullable<Uuid>,
        /// Reviewer.
        reviewer_id -> Nullable<Uuid>,
        /// Final approver.
        approver_id -> Nullable<Uuid>,
        /// Execution responsible.
        responsible_id -> Nullable<Uuid>,
        /// Authorizer.
        authorizer_id -> Nullable<Uuid>,
        /// Scheduled start.
        scheduled_at -> Nullable<Timestamptz>,
        /// Execution start.
        started_at -> Nullable<Timestamptz>,
        /// Execution end.
        ended_at -> Nullable<Timestamptz>,
        /// Report file path.
        report_file -> Nullable<Text>,
        /// Execution detail document.
        execution_detail -> Nullable<Jsonb>,
        /// Spare part lines.
        spare_parts -> Jsonb,
        /// Personnel-hours lines.
        personnel_hours -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
