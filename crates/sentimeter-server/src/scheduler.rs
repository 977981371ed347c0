//! Periodic retraining.
//!
//! The engine only exposes `retrain()`; this module owns the timer.

use std::sync::Arc;
use std::time::Duration;

use sentimeter_model::{ScoringEngine, TrainOutcome};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

const SECONDS_PER_DAY: u64 = 86_400;

fn retrain_interval(days: u64) -> Duration {
    Duration::from_secs(days.max(1).saturating_mul(SECONDS_PER_DAY))
}

/// Builds and starts the scheduler with the retraining job registered.
///
/// The returned handle must be kept alive; dropping it stops the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    engine: Arc<ScoringEngine>,
    interval_days: u64,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_retrain_job(&scheduler, engine, interval_days).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_retrain_job(
    scheduler: &JobScheduler,
    engine: Arc<ScoringEngine>,
    interval_days: u64,
) -> Result<(), JobSchedulerError> {
    let interval = retrain_interval(interval_days);

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            tracing::info!("scheduler: starting model retrain");
            run_retrain(&engine).await;
            tracing::info!("scheduler: model retrain run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(interval_days, "scheduler: registered model retrain job");
    Ok(())
}

async fn run_retrain(engine: &ScoringEngine) {
    match engine.retrain().await {
        Ok(TrainOutcome::Evaluated(metrics)) => tracing::info!(
            train = metrics.train_size,
            test = metrics.test_size,
            positive_f1 = metrics.positive.f1,
            negative_f1 = metrics.negative.f1,
            "scheduler: retrain produced an evaluated generation"
        ),
        Ok(TrainOutcome::Bootstrap) => {
            tracing::warn!("scheduler: retrain fell back to the bootstrap generation");
        }
        Ok(TrainOutcome::Coalesced) => {
            tracing::info!("scheduler: retrain joined an in-flight training run");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: retrain failed; previous generation still serving");
        }
    }
}
