//! Interval job scheduling for the bot's recurring posts.
//!
//! Jobs are registered once at startup and live for the whole process. The
//! scheduler owns one piece of state per job, its last-run time, and runs
//! due handlers sequentially on every tick. A failing handler is logged and
//! its job waits out a full interval like any other; nothing retries early.

mod scheduler;
mod types;

pub use scheduler::Scheduler;
pub use types::{JobDescriptor, JobHandler, RecurringJob};
