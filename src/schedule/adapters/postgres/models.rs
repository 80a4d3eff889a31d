//! Diesel row models for scheduled task persistence.

use super::schema::{repositories, scheduled_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for scheduled tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scheduled_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduledTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning repository.
    pub repository_id: uuid::Uuid,
    /// Push action kind.
    pub kind: String,
    /// Optional target.
    pub target: Option<String>,
    /// Earliest execution time.
    pub scheduled_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Outcome message.
    pub log: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for scheduled tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scheduled_tasks)]
pub struct NewScheduledTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning repository.
    pub repository_id: uuid::Uuid,
    /// Push action kind.
    pub kind: String,
    /// Optional target.
    pub target: Option<String>,
    /// Earliest execution time.
    pub scheduled_time: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Outcome message.
    pub log: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query and insert row for repositories.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = repositories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RepositoryRow {
    /// Repository identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Working copy path.
    pub path: String,
}
