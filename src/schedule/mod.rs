//! Scheduled jobs: cron parsing, schedule descriptors and the job runner.

mod cron;
mod scheduler;

pub use cron::{CronField, CronSchedule};
pub use scheduler::{Scheduler, SchedulerHandle};

use crate::error::{Result, TrellisError};
use async_trait::async_trait;
use std::fmt;

/// A validated cron schedule attached to a `SCHEDULE` component.
///
/// Can only be built through [`ScheduleDescriptor::parse`], so holding one
/// means the raw expression was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleDescriptor {
    raw_cron: String,
    parsed: CronSchedule,
}

impl ScheduleDescriptor {
    pub fn parse(raw_cron: impl Into<String>) -> Result<Self> {
        let raw_cron = raw_cron.into();
        let parsed =
            CronSchedule::parse(&raw_cron).map_err(|reason| TrellisError::schedule(&raw_cron, reason))?;
        Ok(Self { raw_cron, parsed })
    }

    pub fn raw_cron(&self) -> &str {
        &self.raw_cron
    }

    pub fn parsed(&self) -> &CronSchedule {
        &self.parsed
    }
}

impl fmt::Display for ScheduleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_cron)
    }
}

/// The operation a scheduled component runs at each fire time.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn run(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_keeps_raw_expression() {
        let descriptor = ScheduleDescriptor::parse("*/5 * * * *").unwrap();
        assert_eq!(descriptor.raw_cron(), "*/5 * * * *");
        assert!(descriptor.parsed().minutes.contains(55));
    }

    #[test]
    fn test_malformed_expression_is_schedule_error() {
        let err = ScheduleDescriptor::parse("not-a-cron").unwrap_err();
        assert!(matches!(err, TrellisError::Schedule { ref cron, .. } if cron == "not-a-cron"));
        assert!(!err.is_fatal());
    }
}
