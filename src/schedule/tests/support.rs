//! Shared fixtures for scheduling unit tests.

use std::sync::Arc;

use crate::schedule::{
    adapters::memory::{InMemoryScheduledTaskRepository, InMemoryVersionControl},
    domain::{
        PersistedScheduledTaskData, RepositoryId, RepositoryRecord, ScheduledTask,
        ScheduledTaskId, TaskKind, TaskStatus, TaskTarget,
    },
    ports::ScheduledTaskRepository,
    services::PushSchedulerService,
};
use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;

pub type TestService =
    PushSchedulerService<InMemoryScheduledTaskRepository, InMemoryVersionControl, DefaultClock>;

pub struct Harness {
    pub service: TestService,
    pub store: Arc<InMemoryScheduledTaskRepository>,
    pub vcs: Arc<InMemoryVersionControl>,
    pub repository: RepositoryRecord,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryScheduledTaskRepository::new());
        let vcs = Arc::new(InMemoryVersionControl::new());
        let service = PushSchedulerService::new(
            Arc::clone(&store),
            Arc::clone(&vcs),
            Arc::new(DefaultClock),
        );
        let repository = RepositoryRecord::new(RepositoryId::new(), "website", "/srv/website")
            .expect("valid repository");
        service
            .register_repository(&repository)
            .await
            .expect("registration should succeed");
        Self {
            service,
            store,
            vcs,
            repository,
        }
    }

    pub fn repository_id(&self) -> RepositoryId {
        self.repository.id()
    }

    /// Stores a pending task directly, bypassing future-time validation.
    pub async fn seed(
        &self,
        kind: TaskKind,
        target: Option<&str>,
        scheduled_time: DateTime<Utc>,
    ) -> ScheduledTask {
        let task = pending_task(self.repository_id(), kind, target, scheduled_time);
        self.store.store(&task).await.expect("seed should store");
        task
    }

    pub async fn stored(&self, id: ScheduledTaskId) -> Option<ScheduledTask> {
        self.store.find_by_id(id).await.expect("lookup should succeed")
    }
}

pub fn pending_task(
    repository_id: RepositoryId,
    kind: TaskKind,
    target: Option<&str>,
    scheduled_time: DateTime<Utc>,
) -> ScheduledTask {
    let created_at = scheduled_time - Duration::hours(1);
    ScheduledTask::from_persisted(PersistedScheduledTaskData {
        id: ScheduledTaskId::new(),
        repository_id,
        kind,
        target: target.map(|value| TaskTarget::new(value).expect("valid target")),
        scheduled_time,
        status: TaskStatus::Pending,
        log: String::new(),
        created_at,
        updated_at: created_at,
    })
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

pub fn minutes_ahead(minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(minutes)
}
