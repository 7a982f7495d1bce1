//! Scheduler loop — drives [`TimerService::tick`] on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use reefhub_domain::id::JobId;
use reefhub_domain::macros::Macro;
use reefhub_domain::time::Timestamp;
use reefhub_domain::timer::Job;

use crate::ports::{Clock, EntityStore};
use crate::registry::SubsystemRegistry;
use crate::services::TimerService;

/// Cadence and time zone of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Interval between two evaluations. Must stay below one second so no
    /// wall-clock second is skipped.
    pub tick: Duration,
    /// Match job fields against UTC instead of local time.
    pub utc: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            utc: false,
        }
    }
}

/// The wall-clock time job fields are matched against, truncated to the second.
#[must_use]
pub fn wall_time(now: Timestamp, utc: bool) -> NaiveDateTime {
    let naive = if utc {
        now.naive_utc()
    } else {
        now.with_timezone(&Local).naive_local()
    };
    naive.with_nanosecond(0).unwrap_or(naive)
}

/// Evaluate the jobs once for the clock's current time.
pub async fn tick_once<JS, MS, C>(
    timers: &TimerService<JS, MS>,
    registry: &Arc<SubsystemRegistry>,
    clock: &C,
    utc: bool,
) -> Vec<JobId>
where
    JS: EntityStore<Job>,
    MS: EntityStore<Macro>,
    C: Clock,
{
    let now = wall_time(clock.now(), utc);
    match timers.tick(registry, now).await {
        Ok(fired) => fired,
        Err(err) => {
            tracing::warn!(error = %err, %now, "scheduler tick failed");
            Vec::new()
        }
    }
}

/// Run the scheduler until `cancel` fires.
pub async fn run_scheduler<JS, MS, C>(
    timers: Arc<TimerService<JS, MS>>,
    registry: Arc<SubsystemRegistry>,
    clock: C,
    config: SchedulerConfig,
    cancel: CancellationToken,
) where
    JS: EntityStore<Job>,
    MS: EntityStore<Macro>,
    C: Clock,
{
    let mut interval = tokio::time::interval(config.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(tick_ms = config.tick.as_millis(), utc = config.utc, "scheduler started");
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tick_once(&timers, &registry, &clock, config.utc).await;
            }
        }
    }
    tracing::info!("scheduler stopped");
}
