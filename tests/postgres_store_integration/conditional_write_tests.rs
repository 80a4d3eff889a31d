//! Outcome writes and deletes that only apply to pending rows.

use std::io;

use crate::postgres_store_integration::helpers::{
    TestDatabase, TestError, load, minutes_from_now, persist_pending, register, runtime,
    task_with_status,
};
use mockable::DefaultClock;
use repodeck::schedule::{
    domain::{RepositoryId, ScheduledTaskId, TaskKind, TaskStatus},
    ports::ScheduledTaskRepository,
};
use rstest::rstest;
use tokio::runtime::Runtime;

#[rstest]
fn record_outcome_applies_only_while_pending(
    runtime: io::Result<Runtime>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let Some(db) = TestDatabase::create()? else {
        return Ok(());
    };
    let store = db.store()?;
    let repo = register(&rt, &store, "website")?;
    let task = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::PushTagSingle,
        Some("v1.4.0"),
        minutes_from_now(-1),
    )?;

    let mut completed = task.clone();
    completed.complete(&DefaultClock)?;
    let mut failed = task.clone();
    failed.fail("remote hung up", &DefaultClock)?;

    assert!(rt.block_on(store.record_outcome(&completed))?);
    assert!(!rt.block_on(store.record_outcome(&failed))?);

    let stored = load(&rt, &store, task.id())?;
    assert_eq!(stored.status(), TaskStatus::Completed);
    assert_eq!(stored.log(), completed.log());
    Ok(())
}

#[rstest]
fn record_outcome_for_missing_row_reports_false(
    runtime: io::Result<Runtime>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let Some(db) = TestDatabase::create()? else {
        return Ok(());
    };
    let store = db.store()?;
    let repo = register(&rt, &store, "website")?;
    let mut never_stored = task_with_status(
        repo.id(),
        TaskKind::Push,
        None,
        minutes_from_now(-1),
        TaskStatus::Pending,
    )?;
    never_stored.complete(&DefaultClock)?;

    assert!(!rt.block_on(store.record_outcome(&never_stored))?);
    assert!(rt.block_on(store.find_by_id(never_stored.id()))?.is_none());
    Ok(())
}

#[rstest]
fn delete_pending_removes_only_pending_rows_of_the_owner(
    runtime: io::Result<Runtime>,
) -> Result<(), TestError> {
    let rt = runtime?;
    let Some(db) = TestDatabase::create()? else {
        return Ok(());
    };
    let store = db.store()?;
    let repo = register(&rt, &store, "website")?;
    let pending = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::Push,
        None,
        minutes_from_now(30),
    )?;
    let finished = task_with_status(
        repo.id(),
        TaskKind::PushTags,
        None,
        minutes_from_now(-30),
        TaskStatus::Failed,
    )?;
    rt.block_on(store.store(&finished))?;

    assert!(!rt.block_on(store.delete_pending(pending.id(), RepositoryId::new()))?);
    assert!(!rt.block_on(store.delete_pending(finished.id(), repo.id()))?);
    assert!(!rt.block_on(store.delete_pending(ScheduledTaskId::new(), repo.id()))?);
    assert_eq!(load(&rt, &store, pending.id())?.status(), TaskStatus::Pending);
    assert_eq!(load(&rt, &store, finished.id())?.status(), TaskStatus::Failed);

    assert!(rt.block_on(store.delete_pending(pending.id(), repo.id()))?);
    assert!(rt.block_on(store.find_by_id(pending.id()))?.is_none());
    assert!(!rt.block_on(store.delete_pending(pending.id(), repo.id()))?);
    Ok(())
}

#[rstest]
fn outcome_after_delete_is_discarded(runtime: io::Result<Runtime>) -> Result<(), TestError> {
    let rt = runtime?;
    let Some(db) = TestDatabase::create()? else {
        return Ok(());
    };
    let store = db.store()?;
    let repo = register(&rt, &store, "website")?;
    let task = persist_pending(
        &rt,
        &store,
        repo.id(),
        TaskKind::PushCommit,
        Some("9f1c2ab"),
        minutes_from_now(-1),
    )?;
    let mut completed = task.clone();
    completed.complete(&DefaultClock)?;

    assert!(rt.block_on(store.delete_pending(task.id(), repo.id()))?);
    assert!(!rt.block_on(store.record_outcome(&completed))?);
    assert!(rt.block_on(store.find_by_id(task.id()))?.is_none());
    Ok(())
}
