use super::{CronSchedule, Job};
use crate::di::Registry;
use crate::metadata::ComponentType;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

struct ScheduledJob {
    name: String,
    cron: CronSchedule,
    raw_cron: String,
    job: Arc<dyn Job>,
}

/// Runs every `SCHEDULE` component of a registry on its cron schedule (UTC).
#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn from_registry(registry: &Registry) -> Self {
        let jobs = registry
            .get_all(ComponentType::Schedule)
            .into_iter()
            .filter_map(|instance| {
                let schedule = instance.descriptor().schedule()?.clone();
                let job = instance.as_job()?;
                Some(ScheduledJob {
                    name: instance.name().to_string(),
                    cron: schedule.parsed().clone(),
                    raw_cron: schedule.raw_cron().to_string(),
                    job,
                })
            })
            .collect();
        Self { jobs }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Spawn one task per job. Must be called inside a tokio runtime.
    pub fn start(self) -> SchedulerHandle {
        let tasks = self
            .jobs
            .into_iter()
            .map(|scheduled| {
                tracing::info!("Schedule: {} [{}] started", scheduled.name, scheduled.raw_cron);
                tokio::spawn(run_job(scheduled))
            })
            .collect();
        SchedulerHandle { tasks }
    }
}

async fn run_job(scheduled: ScheduledJob) {
    let mut last_fire: Option<DateTime<Utc>> = None;
    loop {
        let now = Utc::now();
        let after = last_fire.map_or(now, |last| last.max(now));
        let Some(next) = scheduled.cron.next_after(after) else {
            tracing::warn!(
                "Schedule {} [{}] never fires again, stopping",
                scheduled.name,
                scheduled.raw_cron
            );
            return;
        };

        let delay = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;
        last_fire = Some(next);

        tracing::debug!("Running scheduled job {}", scheduled.name);
        if let Err(e) = scheduled.job.run().await {
            tracing::error!("Scheduled job {} failed: {:#}", scheduled.name, e);
        }
    }
}

/// Running scheduler tasks.
pub struct SchedulerHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every job. A job that is mid-run is cancelled.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        tracing::info!("Scheduler stopped");
    }
}
