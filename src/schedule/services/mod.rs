//! Application services for deferred push scheduling.

mod scheduler;
mod timers;

pub use scheduler::{
    DEFAULT_EXECUTION_TIMEOUT, ExecutionOutcome, PushSchedulerService, RecoveryReport,
    ScheduleServiceError, ScheduleServiceResult, ScheduleTaskRequest,
};
pub use timers::{TimerHandle, TimerRegistry};
