// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::ScheduleConfig;
use crate::error::RunError;
use crate::job::{RunReport, TrendJob};

/// The job behind a mutex: holding the lock is the run-in-progress guard.
pub type SharedJob = Arc<Mutex<TrendJob>>;

pub fn share(job: TrendJob) -> SharedJob {
    Arc::new(Mutex::new(job))
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(Result<RunReport, RunError>),
    /// Another run holds the job.
    Busy,
}

/// Manual trigger: run now unless a run is already in progress.
pub async fn trigger_now(job: &SharedJob) -> TriggerOutcome {
    let Ok(mut guard) = job.try_lock() else {
        tracing::info!("manual trigger ignored: run already in progress");
        return TriggerOutcome::Busy;
    };
    TriggerOutcome::Completed(guard.execute().await)
}

/// Time until the next scheduled run after `now`.
pub fn next_delay(cfg: &ScheduleConfig, now: DateTime<Utc>) -> Duration {
    match cfg.daily_hour_utc {
        Some(hour) => {
            let today = now.date_naive().and_hms_opt(hour.min(23), 0, 0);
            let mut next = today
                .map(|t| Utc.from_utc_datetime(&t))
                .unwrap_or(now);
            if next <= now {
                next += ChronoDuration::days(1);
            }
            (next - now).to_std().unwrap_or(Duration::from_secs(3600))
        }
        None => Duration::from_secs(cfg.interval_secs.max(1)),
    }
}

/// Spawn the periodic driver. A scheduled tick waits for any manual run to
/// finish instead of skipping.
pub fn spawn_scheduler(job: SharedJob, cfg: ScheduleConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        if cfg.run_on_start {
            run_scheduled(&job).await;
        }
        loop {
            let now = Utc::now();
            let delay = next_delay(&cfg, now);
            let next_run = now + ChronoDuration::from_std(delay).unwrap_or_else(|_| ChronoDuration::zero());
            tracing::info!(next_run = %next_run.to_rfc3339(), "scheduler sleeping");
            tokio::time::sleep(delay).await;
            run_scheduled(&job).await;
        }
    })
}

async fn run_scheduled(job: &SharedJob) {
    let mut guard = job.lock().await;
    match guard.execute().await {
        Ok(report) => tracing::info!(
            execution = report.execution,
            processed = report.processed,
            failed = report.failed,
            "scheduled run finished"
        ),
        Err(e) => tracing::warn!(error = %e, "scheduled run ended with error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_mode_uses_fixed_cadence() {
        let cfg = ScheduleConfig {
            interval_secs: 900,
            daily_hour_utc: None,
            run_on_start: false,
        };
        assert_eq!(next_delay(&cfg, Utc::now()), Duration::from_secs(900));
    }

    #[test]
    fn daily_mode_targets_next_occurrence() {
        let cfg = ScheduleConfig {
            interval_secs: 900,
            daily_hour_utc: Some(9),
            run_on_start: false,
        };
        let before = Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 0).unwrap();
        assert_eq!(next_delay(&cfg, before), Duration::from_secs(90 * 60));

        let after = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        assert_eq!(next_delay(&cfg, after), Duration::from_secs(24 * 3600));
    }
}
