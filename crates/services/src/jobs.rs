// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Deferred admin jobs.

use alfio_domain::{AdminJob, AdminJobStatus};
use alfio_persistence::{Persistence, Store};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::settings::ReservationSettings;

/// Outcome of one sweep over due jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobRunSummary {
    pub executed: usize,
    pub rescheduled: usize,
    pub failed: usize,
}

/// Schedules jobs and runs the due ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminJobManager;

impl AdminJobManager {
    /// Schedules `job_name` with `payload` at `execute_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn schedule(
        store: &mut Store<'_>,
        job_name: &str,
        payload: serde_json::Value,
        execute_at: OffsetDateTime,
    ) -> Result<i64, ServiceError> {
        let job = AdminJob {
            id: 0,
            job_name: job_name.to_string(),
            payload,
            execute_at,
            status: AdminJobStatus::Scheduled,
            attempts: 0,
            last_error: None,
        };
        Ok(store.insert_admin_job(&job)?)
    }

    /// Runs the jobs due at `now`.
    ///
    /// Jobs are claimed as RUNNING in a short transaction, then `handler` runs
    /// each one outside of it. A failing job is rescheduled with a linear
    /// backoff until it reaches the maximum number of attempts.
    ///
    /// # Errors
    ///
    /// Returns an error if jobs cannot be claimed or their outcome cannot be
    /// stored. Handler errors are recorded on the job instead.
    pub fn execute_due<F>(
        persistence: &mut Persistence,
        settings: &ReservationSettings,
        now: OffsetDateTime,
        mut handler: F,
    ) -> Result<JobRunSummary, ServiceError>
    where
        F: FnMut(&mut Persistence, &AdminJob) -> Result<(), ServiceError>,
    {
        let jobs: Vec<AdminJob> = persistence.transaction(|store| {
            let jobs = store.lock_due_jobs(now, settings.job_batch_size)?;
            for job in &jobs {
                store.update_admin_job(
                    job.id,
                    AdminJobStatus::Running,
                    job.attempts,
                    job.execute_at,
                    job.last_error.as_deref(),
                )?;
            }
            Ok::<_, ServiceError>(jobs)
        })?;

        let mut summary = JobRunSummary::default();
        for job in jobs {
            let attempts = job.attempts.saturating_add(1);
            let outcome = handler(persistence, &job);
            persistence.transaction(|store| {
                match &outcome {
                    Ok(()) => {
                        store.update_admin_job(job.id, AdminJobStatus::Executed, attempts, now, None)?;
                        summary.executed += 1;
                    }
                    Err(err) if attempts >= settings.job_max_attempts => {
                        warn!(job_id = job.id, job_name = %job.job_name, attempts, error = %err, "Admin job abandoned");
                        store.update_admin_job(
                            job.id,
                            AdminJobStatus::Failed,
                            attempts,
                            now,
                            Some(&err.to_string()),
                        )?;
                        summary.failed += 1;
                    }
                    Err(err) => {
                        let retry_at = now + settings.finalize_retry_delay * attempts;
                        warn!(job_id = job.id, job_name = %job.job_name, attempts, %retry_at, error = %err, "Admin job rescheduled");
                        store.update_admin_job(
                            job.id,
                            AdminJobStatus::Scheduled,
                            attempts,
                            retry_at,
                            Some(&err.to_string()),
                        )?;
                        summary.rescheduled += 1;
                    }
                }
                Ok::<_, ServiceError>(())
            })?;
        }

        if summary != JobRunSummary::default() {
            info!(
                executed = summary.executed,
                rescheduled = summary.rescheduled,
                failed = summary.failed,
                "Admin jobs processed"
            );
        }
        Ok(summary)
    }
}
