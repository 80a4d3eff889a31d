//! `PostgreSQL` task store implementation.

use super::{
    models::{NewScheduledTaskRow, RepositoryRow, ScheduledTaskRow},
    schema::{repositories, scheduled_tasks},
};
use crate::schedule::{
    domain::{
        ExecutableTask, PersistedScheduledTaskData, RepositoryId, RepositoryRecord, ScheduledTask,
        ScheduledTaskId, TaskKind, TaskStatus, TaskTarget,
    },
    ports::{
        RepositoryCatalog, ScheduledTaskRepository, TaskRepositoryError, TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by scheduling adapters.
pub type SchedulePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store and repository catalog.
#[derive(Debug, Clone)]
pub struct PostgresScheduledTaskRepository {
    pool: SchedulePgPool,
}

impl PostgresScheduledTaskRepository {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SchedulePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl ScheduledTaskRepository for PostgresScheduledTaskRepository {
    async fn store(&self, task: &ScheduledTask) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let repository_id = task.repository_id();
        let new_row = to_new_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(scheduled_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        TaskRepositoryError::RepositoryNotFound(repository_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: ScheduledTaskId,
    ) -> TaskRepositoryResult<Option<ScheduledTask>> {
        self.run_blocking(move |connection| {
            let row = scheduled_tasks::table
                .filter(scheduled_tasks::id.eq(id.into_inner()))
                .select(ScheduledTaskRow::as_select())
                .first::<ScheduledTaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_for_repository(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Option<ScheduledTask>> {
        self.run_blocking(move |connection| {
            let row = scheduled_tasks::table
                .filter(scheduled_tasks::id.eq(id.into_inner()))
                .filter(scheduled_tasks::repository_id.eq(repository_id.into_inner()))
                .select(ScheduledTaskRow::as_select())
                .first::<ScheduledTaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_executable(
        &self,
        id: ScheduledTaskId,
    ) -> TaskRepositoryResult<Option<ExecutableTask>> {
        self.run_blocking(move |connection| {
            let row = scheduled_tasks::table
                .inner_join(repositories::table)
                .filter(scheduled_tasks::id.eq(id.into_inner()))
                .select((ScheduledTaskRow::as_select(), RepositoryRow::as_select()))
                .first::<(ScheduledTaskRow, RepositoryRow)>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(rows_to_executable).transpose()
        })
        .await
    }

    async fn find_pending(&self) -> TaskRepositoryResult<Vec<ExecutableTask>> {
        self.run_blocking(move |connection| {
            let rows = scheduled_tasks::table
                .inner_join(repositories::table)
                .filter(scheduled_tasks::status.eq(TaskStatus::Pending.as_str()))
                .order(scheduled_tasks::scheduled_time.asc())
                .select((ScheduledTaskRow::as_select(), RepositoryRow::as_select()))
                .load::<(ScheduledTaskRow, RepositoryRow)>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(rows_to_executable).collect()
        })
        .await
    }

    async fn list_for_repository(
        &self,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<Vec<ScheduledTask>> {
        self.run_blocking(move |connection| {
            let rows = scheduled_tasks::table
                .filter(scheduled_tasks::repository_id.eq(repository_id.into_inner()))
                .order(scheduled_tasks::scheduled_time.desc())
                .select(ScheduledTaskRow::as_select())
                .load::<ScheduledTaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn record_outcome(&self, task: &ScheduledTask) -> TaskRepositoryResult<bool> {
        let id = task.id().into_inner();
        let status = task.status().as_str();
        let log = task.log().to_owned();
        let updated_at = task.updated_at();

        self.run_blocking(move |connection| {
            // The status predicate makes this the serialization point against
            // a concurrent cancel or duplicate fire.
            let updated = diesel::update(
                scheduled_tasks::table
                    .filter(scheduled_tasks::id.eq(id))
                    .filter(scheduled_tasks::status.eq(TaskStatus::Pending.as_str())),
            )
            .set((
                scheduled_tasks::status.eq(status),
                scheduled_tasks::log.eq(log),
                scheduled_tasks::updated_at.eq(updated_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete_pending(
        &self,
        id: ScheduledTaskId,
        repository_id: RepositoryId,
    ) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                scheduled_tasks::table
                    .filter(scheduled_tasks::id.eq(id.into_inner()))
                    .filter(scheduled_tasks::repository_id.eq(repository_id.into_inner()))
                    .filter(scheduled_tasks::status.eq(TaskStatus::Pending.as_str())),
            )
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl RepositoryCatalog for PostgresScheduledTaskRepository {
    async fn register(&self, repository: &RepositoryRecord) -> TaskRepositoryResult<()> {
        let row = RepositoryRow {
            id: repository.id().into_inner(),
            name: repository.name().to_owned(),
            path: repository.working_copy().to_string(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(repositories::table)
                .values(&row)
                .on_conflict(repositories::id)
                .do_update()
                .set(&row)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }

    async fn find_repository(
        &self,
        id: RepositoryId,
    ) -> TaskRepositoryResult<Option<RepositoryRecord>> {
        self.run_blocking(move |connection| {
            let row = repositories::table
                .filter(repositories::id.eq(id.into_inner()))
                .select(RepositoryRow::as_select())
                .first::<RepositoryRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_repository).transpose()
        })
        .await
    }
}

fn to_new_row(task: &ScheduledTask) -> NewScheduledTaskRow {
    NewScheduledTaskRow {
        id: task.id().into_inner(),
        repository_id: task.repository_id().into_inner(),
        kind: task.kind().as_str().to_owned(),
        target: task.target().map(|target| target.as_str().to_owned()),
        scheduled_time: task.scheduled_time(),
        status: task.status().as_str().to_owned(),
        log: task.log().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: ScheduledTaskRow) -> TaskRepositoryResult<ScheduledTask> {
    let ScheduledTaskRow {
        id,
        repository_id,
        kind: persisted_kind,
        target: persisted_target,
        scheduled_time,
        status: persisted_status,
        log,
        created_at,
        updated_at,
    } = row;

    let kind =
        TaskKind::try_from(persisted_kind.as_str()).map_err(TaskRepositoryError::persistence)?;
    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let target = persisted_target
        .map(TaskTarget::new)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;

    Ok(ScheduledTask::from_persisted(PersistedScheduledTaskData {
        id: ScheduledTaskId::from_uuid(id),
        repository_id: RepositoryId::from_uuid(repository_id),
        kind,
        target,
        scheduled_time,
        status,
        log,
        created_at,
        updated_at,
    }))
}

fn row_to_repository(row: RepositoryRow) -> TaskRepositoryResult<RepositoryRecord> {
    RepositoryRecord::new(RepositoryId::from_uuid(row.id), row.name, row.path)
        .map_err(TaskRepositoryError::persistence)
}

fn rows_to_executable(
    (task_row, repository_row): (ScheduledTaskRow, RepositoryRow),
) -> TaskRepositoryResult<ExecutableTask> {
    Ok(ExecutableTask {
        task: row_to_task(task_row)?,
        repository: row_to_repository(repository_row)?,
    })
}
