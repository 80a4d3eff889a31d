//! `PostgreSQL` adapters for scheduled task persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresScheduledTaskRepository, SchedulePgPool};

/// SQL creating the `repositories` and `scheduled_tasks` tables.
pub const CREATE_SCHEDULE_TABLES_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_scheduled_tasks/up.sql");
