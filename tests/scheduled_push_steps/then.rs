//! Then steps for scheduled push BDD scenarios.

use super::world::{ScheduleWorld, run_async};
use eyre::WrapErr;
use repodeck::schedule::{
    adapters::memory::VersionControlCall,
    domain::{ScheduleDomainError, ScheduledTask, ScheduledTaskId},
    ports::ScheduledTaskRepository,
    services::ScheduleServiceError,
};
use rstest_bdd_macros::then;

fn load(world: &ScheduleWorld, id: ScheduledTaskId) -> Result<ScheduledTask, eyre::Report> {
    run_async(world.store.find_by_id(id))
        .wrap_err("load task")?
        .ok_or_else(|| eyre::eyre!("task {id} is missing from the store"))
}

// The outcome returned by the fire must match what was persisted.
fn load_fired(world: &ScheduleWorld) -> Result<ScheduledTask, eyre::Report> {
    let task = load(world, world.current_task()?.id())?;
    let reported = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing execution outcome in scenario world"))?
        .task();
    if reported != Some(&task) {
        return Err(eyre::eyre!("outcome {reported:?} disagrees with stored {task:?}"));
    }
    Ok(task)
}

#[then("no task with that id is stored")]
fn task_removed(world: &ScheduleWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id();
    let found = run_async(world.store.find_by_id(task_id)).wrap_err("load task")?;
    if found.is_some() {
        return Err(eyre::eyre!("cancelled task {task_id} is still stored"));
    }
    if world.service.timers().is_armed(task_id) {
        return Err(eyre::eyre!("cancelled task {task_id} still has a timer"));
    }
    Ok(())
}

#[then("firing the task's timer performs no adapter call")]
fn stale_fire_is_a_no_op(world: &ScheduleWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id();
    let outcome = run_async(world.service.execute_task(task_id));
    if !outcome.is_skipped() {
        return Err(eyre::eyre!("expected a skipped execution, got {outcome:?}"));
    }
    let calls = world.vcs.calls().wrap_err("read adapter calls")?;
    if !calls.is_empty() {
        return Err(eyre::eyre!("expected no adapter calls, got {calls:?}"));
    }
    Ok(())
}

#[then(r#"the task is "{status}" with a log containing "{fragment}""#)]
fn task_finished_with_log_fragment(
    world: &ScheduleWorld,
    status: String,
    fragment: String,
) -> Result<(), eyre::Report> {
    let task = load_fired(world)?;
    if task.status().as_str() != status {
        return Err(eyre::eyre!("expected {status}, found {}", task.status()));
    }
    if !task.log().contains(&fragment) {
        return Err(eyre::eyre!(
            "expected log containing {fragment:?}, found {:?}",
            task.log()
        ));
    }
    Ok(())
}

#[then(r#"the task is "{status}" with log "{log}""#)]
fn task_finished_with_log(
    world: &ScheduleWorld,
    status: String,
    log: String,
) -> Result<(), eyre::Report> {
    let task = load_fired(world)?;
    if task.status().as_str() != status {
        return Err(eyre::eyre!("expected {status}, found {}", task.status()));
    }
    if task.log() != log {
        return Err(eyre::eyre!("expected log {log:?}, found {:?}", task.log()));
    }
    Ok(())
}

#[then(r#"the adapter pushed "{refspec}" to "{remote}""#)]
fn adapter_pushed(
    world: &ScheduleWorld,
    refspec: String,
    remote: String,
) -> Result<(), eyre::Report> {
    let calls = world.vcs.calls().wrap_err("read adapter calls")?;
    let expected = VersionControlCall::PushToRemote { remote, refspec };
    if calls != vec![expected.clone()] {
        return Err(eyre::eyre!("expected only {expected:?}, got {calls:?}"));
    }
    Ok(())
}

#[then("the request is rejected because the time is not in the future")]
fn rejected_as_past(world: &ScheduleWorld) -> Result<(), eyre::Report> {
    match &world.last_schedule_result {
        Some(Err(ScheduleServiceError::Validation(
            ScheduleDomainError::ScheduleTimeNotInFuture,
        ))) => Ok(()),
        other => Err(eyre::eyre!("expected a past-time rejection, got {other:?}")),
    }
}

#[then("no tasks are stored")]
fn store_is_empty(world: &ScheduleWorld) -> Result<(), eyre::Report> {
    let count = world.store.task_count().wrap_err("count tasks")?;
    if count != 0 {
        return Err(eyre::eyre!("expected an empty store, found {count} tasks"));
    }
    if !world.service.timers().is_empty() {
        return Err(eyre::eyre!("expected no armed timers"));
    }
    Ok(())
}

#[then(r#"the overdue task is "{status}""#)]
fn overdue_task_finished(world: &ScheduleWorld, status: String) -> Result<(), eyre::Report> {
    let overdue = world
        .overdue_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing overdue task in scenario world"))?;
    let task = load(world, overdue.id())?;
    if task.status().as_str() != status {
        return Err(eyre::eyre!("expected {status}, found {}", task.status()));
    }
    Ok(())
}

#[then("the future task is pending with a live timer")]
fn future_task_armed(world: &ScheduleWorld) -> Result<(), eyre::Report> {
    let future = world
        .future_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing future task in scenario world"))?;
    let task = load(world, future.id())?;
    if !task.is_pending() {
        return Err(eyre::eyre!("expected pending, found {}", task.status()));
    }
    if !world.service.timers().is_armed(future.id()) {
        return Err(eyre::eyre!("future task {} has no timer", future.id()));
    }
    Ok(())
}
