//! Restarting the service over a store that outlived the previous process.

use std::io;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::scheduler_integration::helpers::{
    TestError, load, persist_pending, register, runtime, scheduler, store, vcs,
};
use chrono::{Duration, Utc};
use repodeck::schedule::{
    adapters::memory::{InMemoryScheduledTaskRepository, InMemoryVersionControl},
    domain::{TaskKind, TaskStatus},
    services::ScheduleTaskRequest,
};
use rstest::rstest;
use tokio::runtime::Runtime;

/// Tasks scheduled before shutdown are re-armed by the next process.
#[rstest]
fn scheduled_tasks_survive_a_restart(
    runtime: io::Result<Runtime>,
    store: Arc<InMemoryScheduledTaskRepository>,
    vcs: Arc<InMemoryVersionControl>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let before = scheduler(&store, &vcs);
    let repo = register(&rt, &before, "website", "/srv/website")?;
    let task = rt.block_on(before.schedule(ScheduleTaskRequest::new(
        repo.id(),
        "push",
        Utc::now() + Duration::hours(6),
    )))?;
    assert_eq!(before.shutdown(), 1);

    let after = scheduler(&store, &vcs);
    let report = rt.block_on(after.recover_pending_tasks())?;

    assert_eq!(report.armed, vec![task.id()]);
    assert!(report.executed.is_empty());
    assert!(after.timers().is_armed(task.id()));
    assert!(!before.timers().is_armed(task.id()));
    assert_eq!(after.shutdown(), 1);
    Ok(())
}

/// A recovered timer can still be cancelled through the new process.
#[rstest]
fn recovered_task_can_be_cancelled(
    runtime: io::Result<Runtime>,
    store: Arc<InMemoryScheduledTaskRepository>,
    vcs: Arc<InMemoryVersionControl>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let service = scheduler(&store, &vcs);
    let repo = register(&rt, &service, "website", "/srv/website")?;
    let task = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::PushTags,
        None,
        Utc::now() + Duration::hours(1),
    )?;
    rt.block_on(service.recover_pending_tasks())?;

    rt.block_on(service.cancel(repo.id(), task.id()))?;

    assert!(service.timers().is_empty());
    assert!(rt.block_on(service.list_tasks(repo.id()))?.is_empty());
    Ok(())
}

/// Overdue tasks run once at startup and do not run again on a second
/// recovery.
#[rstest]
fn overdue_tasks_run_exactly_once_across_restarts(
    runtime: io::Result<Runtime>,
    store: Arc<InMemoryScheduledTaskRepository>,
    vcs: Arc<InMemoryVersionControl>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let first = scheduler(&store, &vcs);
    let repo = register(&rt, &first, "website", "/srv/website")?;
    let overdue = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::Push,
        None,
        Utc::now() - Duration::days(1),
    )?;

    let first_report = rt.block_on(first.recover_pending_tasks())?;
    let second = scheduler(&store, &vcs);
    let second_report = rt.block_on(second.recover_pending_tasks())?;

    assert_eq!(first_report.executed, vec![overdue.id()]);
    assert!(second_report.executed.is_empty());
    assert_eq!(vcs.calls()?.len(), 1);
    assert_eq!(load(&rt, &store, overdue.id())?.status(), TaskStatus::Completed);
    Ok(())
}

/// A short timer armed during recovery fires while the runtime is driven.
#[rstest]
fn recovered_timer_fires_when_due(
    runtime: io::Result<Runtime>,
    store: Arc<InMemoryScheduledTaskRepository>,
    vcs: Arc<InMemoryVersionControl>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let service = scheduler(&store, &vcs);
    let repo = register(&rt, &service, "website", "/srv/website")?;
    let task = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::Push,
        None,
        Utc::now() + Duration::milliseconds(200),
    )?;

    rt.block_on(async {
        service.recover_pending_tasks().await?;
        tokio::time::sleep(StdDuration::from_millis(600)).await;
        Ok::<_, TestError>(())
    })?;

    assert_eq!(load(&rt, &store, task.id())?.status(), TaskStatus::Completed);
    assert!(service.timers().is_empty());
    Ok(())
}
