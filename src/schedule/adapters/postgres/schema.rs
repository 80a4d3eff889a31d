//! Diesel schema for scheduled task persistence.

diesel::table! {
    /// Registered repository working copies.
    repositories (id) {
        /// Repository identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Absolute working copy path.
        path -> Text,
    }
}

diesel::table! {
    /// Deferred push tasks and their outcomes.
    scheduled_tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning repository.
        repository_id -> Uuid,
        /// Push action kind.
        #[max_length = 32]
        kind -> Varchar,
        /// Tag name or commit identifier for targeted kinds.
        #[max_length = 255]
        target -> Nullable<Varchar>,
        /// Earliest execution time.
        scheduled_time -> Timestamptz,
        /// Lifecycle status.
        #[max_length = 16]
        status -> Varchar,
        /// Outcome message.
        log -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(scheduled_tasks -> repositories (repository_id));
diesel::allow_tables_to_appear_in_same_query!(repositories, scheduled_tasks);
