//! Process-local registry of armed task timers.
//!
//! The registry is not durable: it starts empty and is rebuilt by
//! [`PushSchedulerService::recover_pending_tasks`](super::PushSchedulerService::recover_pending_tasks).

use crate::schedule::domain::ScheduledTaskId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Longest single sleep; longer delays are slept in several chunks.
const MAX_SLEEP_CHUNK: Duration = Duration::from_secs(24 * 60 * 60);

/// Cancellable handle for one armed timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    task_id: ScheduledTaskId,
    generation: u64,
    token: CancellationToken,
}

impl TimerHandle {
    /// Returns the task this timer fires for.
    #[must_use]
    pub const fn task_id(&self) -> ScheduledTaskId {
        self.task_id
    }

    /// Prevents the timer from firing. Has no effect once the job started.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the timer has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct TimerTable {
    timers: HashMap<ScheduledTaskId, TimerHandle>,
    next_generation: u64,
}

/// Map from task identifier to its armed timer.
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    table: Arc<Mutex<TimerTable>>,
}

impl TimerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimerTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arms a timer that runs `job` after `delay`.
    ///
    /// Re-arming an identifier cancels its previous timer. The entry is
    /// removed from the registry just before `job` starts. Must be called
    /// from within a Tokio runtime.
    pub fn arm<F>(&self, task_id: ScheduledTaskId, delay: Duration, job: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = {
            let mut table = self.lock();
            let generation = table.next_generation;
            table.next_generation = generation.wrapping_add(1);
            let handle = TimerHandle {
                task_id,
                generation,
                token: CancellationToken::new(),
            };
            if let Some(previous) = table.timers.insert(task_id, handle.clone()) {
                previous.cancel();
            }
            handle
        };

        let registry = self.clone();
        let fired = handle.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = fired.token.cancelled() => {
                    debug!(task_id = %fired.task_id, "timer disarmed before firing");
                    return;
                }
                () = sleep_in_chunks(delay) => {}
            }
            if registry.release(&fired) {
                debug!(task_id = %fired.task_id, "timer fired");
                job.await;
            }
        });

        handle
    }

    /// Removes the fired timer's entry.
    ///
    /// Returns `false`, leaving the table alone, when the timer was cancelled
    /// or its entry was replaced or removed meanwhile.
    fn release(&self, fired: &TimerHandle) -> bool {
        let mut table = self.lock();
        if fired.is_cancelled() {
            return false;
        }
        let is_current = table
            .timers
            .get(&fired.task_id)
            .is_some_and(|current| current.generation == fired.generation);
        if is_current {
            table.timers.remove(&fired.task_id);
        }
        is_current
    }

    /// Cancels and removes the timer for `task_id`.
    ///
    /// Returns `false` when no timer was armed. Cancellation happens under
    /// the table lock, so a timer that has not yet released itself never
    /// runs its job after this returns `true`.
    pub fn disarm(&self, task_id: ScheduledTaskId) -> bool {
        let mut table = self.lock();
        let Some(handle) = table.timers.remove(&task_id) else {
            return false;
        };
        handle.cancel();
        true
    }

    /// Returns `true` when a timer is armed for `task_id`.
    #[must_use]
    pub fn is_armed(&self, task_id: ScheduledTaskId) -> bool {
        self.lock().timers.contains_key(&task_id)
    }

    /// Returns the identifiers with armed timers.
    #[must_use]
    pub fn armed_ids(&self) -> Vec<ScheduledTaskId> {
        self.lock().timers.keys().copied().collect()
    }

    /// Returns the number of armed timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().timers.len()
    }

    /// Returns `true` when no timer is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().timers.is_empty()
    }

    /// Cancels every armed timer and returns how many there were.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut table = self.lock();
        let disarmed = table.timers.len();
        for (_, handle) in table.timers.drain() {
            handle.cancel();
        }
        disarmed
    }
}

async fn sleep_in_chunks(delay: Duration) {
    let mut remaining = delay;
    while !remaining.is_zero() {
        let chunk = remaining.min(MAX_SLEEP_CHUNK);
        tokio::time::sleep(chunk).await;
        remaining = remaining.saturating_sub(chunk);
    }
}
