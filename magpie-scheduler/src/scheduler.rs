//! Scheduler core: due-job bookkeeping and the tick loop.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::types::{JobDescriptor, JobHandler, RecurringJob};

/// Tracks named recurring jobs and invokes due ones at interval boundaries.
pub struct Scheduler {
    jobs: RwLock<Vec<RecurringJob>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
        }
    }

    /// Register a job. Its last-run time starts at the epoch, so the first
    /// tick that sees it will fire it.
    pub async fn register(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        interval: Duration,
        handler: JobHandler,
    ) {
        let job = RecurringJob::new(name.into(), description.into(), interval, handler);
        tracing::info!(job = %job.name, interval = %job.interval, "scheduler.registered");
        self.jobs.write().await.push(job);
    }

    /// Run every due job once, sequentially, then stamp each with the tick
    /// time.
    ///
    /// The stamp happens after the handler settles and regardless of its
    /// outcome: a failing job waits out a full interval before its next
    /// attempt, and one job's failure never stops the jobs after it.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let due: Vec<(String, JobHandler)> = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .filter(|job| job.is_due(now))
                .map(|job| (job.name.clone(), job.handler.clone()))
                .collect()
        };

        for (name, handler) in due {
            tracing::debug!(job = %name, "scheduler.job.start");
            match handler(None).await {
                Ok(()) => tracing::info!(job = %name, "scheduler.job.ok"),
                Err(err) => tracing::error!(job = %name, error = %err, "scheduler.job.failed"),
            }

            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.iter_mut().find(|job| job.name == name) {
                job.last_run = now;
            }
        }
    }

    /// Tick repeatedly until cancelled. A slow handler delays later ticks
    /// rather than letting them pile up.
    pub async fn run(&self, tick_interval: std::time::Duration, cancel: CancellationToken) {
        tracing::info!(tick = ?tick_interval, "scheduler.starting");
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("scheduler.stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }
    }

    /// Snapshot of every registered job for the listing endpoint.
    pub async fn descriptors(&self) -> Vec<JobDescriptor> {
        self.jobs
            .read()
            .await
            .iter()
            .map(|job| JobDescriptor {
                name: job.name.clone(),
                schedule: humantime::format_duration(job.interval.to_std().unwrap_or_default())
                    .to_string(),
                description: job.description.clone(),
            })
            .collect()
    }

    /// Run one job immediately, outside its schedule.
    ///
    /// The job's last-run time is left alone, so a manual trigger never
    /// delays or hastens the next scheduled run. Returns `None` for an
    /// unknown job name.
    pub async fn trigger(
        &self,
        name: &str,
        override_text: Option<String>,
    ) -> Option<anyhow::Result<()>> {
        let handler = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .find(|job| job.name == name)
                .map(|job| job.handler.clone())
        }?;

        tracing::info!(job = %name, "scheduler.trigger");
        Some(handler(override_text).await)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
