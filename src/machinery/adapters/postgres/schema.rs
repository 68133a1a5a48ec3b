//! Diesel schema for machinery persistence.

diesel::table! {
    /// Machine records.
    machines (id) {
        /// Internal machine identifier.
        id -> Uuid,
        /// Unique plate/serial code.
        #[max_length = 100]
        code -> Varchar,
        /// Display name or model.
        #[max_length = 150]
        name -> Varchar,
        /// Free-text description.
        description -> Nullable<Text>,
        /// Operational state.
        #[max_length = 32]
        state -> Varchar,
        /// Responsible person.
        responsible_id -> Nullable<Uuid>,
        /// Machine type.
        machine_type_id -> Nullable<Uuid>,
        /// Active flag.
        active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Machine type (line of work) records.
    machine_types (id) {
        /// Internal machine type identifier.
        id -> Uuid,
        /// Unique name.
        #[max_length = 100]
        name -> Varchar,
        /// Active flag.
        active -> Bool,
    }
}
