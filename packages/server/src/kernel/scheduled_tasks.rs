//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Two independent periodic jobs reconcile registration state:
//! - Cleanup: purge expired OTP codes and expired/completed sessions
//! - Reminder sweep: escalate unacknowledged codes over the fallback channel
//!
//! # Architecture
//!
//! The jobs touch the stores through the domain services directly, never
//! through the registration orchestrator. Job bodies catch and log errors;
//! a failed run is retried on the next tick, so reconciliation is eventually
//! consistent without a persistent retry queue.

use std::time::Duration;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::registration::{OtpService, SessionService};

/// Start all scheduled tasks
pub async fn start_scheduler(
    otp_service: OtpService,
    session_service: SessionService,
    cleanup_interval: Duration,
    reminder_sweep_interval: Duration,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Cleanup task - purges expired OTP codes and stale sessions
    let cleanup_otp = otp_service.clone();
    let cleanup_sessions = session_service.clone();
    let cleanup_job = Job::new_repeated_async(cleanup_interval, move |_uuid, _lock| {
        let otp = cleanup_otp.clone();
        let sessions = cleanup_sessions.clone();
        Box::pin(async move {
            if let Err(e) = run_cleanup(&otp, &sessions).await {
                tracing::error!("Cleanup task failed: {}", e);
            }
        })
    })?;

    scheduler.add(cleanup_job).await?;

    // Reminder sweep - escalates delivery for unseen codes
    let sweep_otp = otp_service.clone();
    let reminder_job = Job::new_repeated_async(reminder_sweep_interval, move |_uuid, _lock| {
        let otp = sweep_otp.clone();
        Box::pin(async move {
            if let Err(e) = otp.reminder_sweep().await {
                tracing::error!("Reminder sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(reminder_job).await?;
    scheduler.start().await?;

    tracing::info!(
        "Scheduled tasks started (cleanup every {:?}, reminder sweep every {:?})",
        cleanup_interval,
        reminder_sweep_interval
    );
    Ok(scheduler)
}

/// Run one cleanup pass over both stores
async fn run_cleanup(otp: &OtpService, sessions: &SessionService) -> Result<()> {
    tracing::info!("Running expired data cleanup");

    let otps_deleted = otp.cleanup().await?;
    let (expired, completed) = sessions.cleanup().await?;

    tracing::info!(
        "Cleanup complete: {} OTP codes, {} expired sessions, {} completed sessions removed",
        otps_deleted,
        expired,
        completed
    );

    Ok(())
}
