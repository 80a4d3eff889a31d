//! When steps for scheduled push BDD scenarios.

use super::world::{ScheduleWorld, run_async};
use chrono::{Duration, Utc};
use eyre::WrapErr;
use repodeck::schedule::services::ScheduleTaskRequest;
use rstest_bdd_macros::when;

#[when("the task is cancelled")]
fn cancel_task(world: &mut ScheduleWorld) -> Result<(), eyre::Report> {
    let repository_id = world.repository()?.id();
    let task_id = world.current_task()?.id();
    run_async(world.service.cancel(repository_id, task_id)).wrap_err("cancel task")?;
    Ok(())
}

#[when("the task's timer fires")]
fn timer_fires(world: &mut ScheduleWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?.id();
    world.service.timers().disarm(task_id);
    world.last_outcome = Some(run_async(world.service.execute_task(task_id)));
    Ok(())
}

#[when(r#"a "{kind}" task is requested for {minutes:i64} minutes ago"#)]
fn request_in_the_past(
    world: &mut ScheduleWorld,
    kind: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    let request = ScheduleTaskRequest::new(
        world.repository()?.id(),
        kind,
        Utc::now() - Duration::minutes(minutes),
    );
    world.last_schedule_result = Some(run_async(world.service.schedule(request)));
    Ok(())
}

#[when("the scheduler restarts and recovers pending tasks")]
fn restart_and_recover(world: &mut ScheduleWorld) -> Result<(), eyre::Report> {
    world.restart();
    run_async(world.service.recover_pending_tasks()).wrap_err("recover pending tasks")?;
    Ok(())
}
