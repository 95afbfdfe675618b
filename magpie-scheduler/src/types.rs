//! Job types shared between the scheduler core and its callers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Type alias for a job's async action.
///
/// The optional argument is free-text override material supplied by a manual
/// trigger; scheduled runs always pass `None`.
pub type JobHandler = Arc<
    dyn Fn(Option<String>) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send
        + Sync,
>;

/// One registered recurring job.
#[derive(Clone)]
pub struct RecurringJob {
    pub name: String,
    pub description: String,
    pub interval: Duration,
    /// Starts at the epoch, so a job is due on the first tick it is seen.
    pub last_run: DateTime<Utc>,
    pub(crate) handler: JobHandler,
}

impl RecurringJob {
    pub fn new(name: String, description: String, interval: Duration, handler: JobHandler) -> Self {
        Self {
            name,
            description,
            interval,
            last_run: DateTime::<Utc>::UNIX_EPOCH,
            handler,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_run >= self.interval
    }
}

impl std::fmt::Debug for RecurringJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecurringJob")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("last_run", &self.last_run)
            .finish_non_exhaustive()
    }
}

/// What the job-listing endpoint reports about a registered job.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescriptor {
    pub name: String,
    pub schedule: String,
    pub description: String,
}
