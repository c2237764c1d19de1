use crate::usecases::lesson_scheduler::LessonSchedulerUseCase;
use anyhow::Result;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

/// Runs the scheduler once at the top of every hour, forever.
pub async fn run_scheduler_loop(usecase: Arc<LessonSchedulerUseCase>) -> Result<()> {
    info!("scheduler_loop: starting");
    loop {
        let tick = next_tick(Utc::now());
        let wait = (tick - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        info!(%tick, wait_secs = wait.as_secs(), "scheduler_loop: sleeping until next tick");
        tokio::time::sleep(wait).await;

        if let Err(e) = usecase.run(tick).await {
            error!(%tick, error = ?e, "scheduler_loop: run failed");
        }
    }
}

/// Start of the hour following `now`.
pub fn next_tick(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = TimeDelta::hours(1);
    now.duration_trunc(hour).unwrap_or(now) + hour
}
