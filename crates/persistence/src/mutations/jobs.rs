// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Admin job queue writes.

use alfio_domain::{AdminJob, AdminJobStatus};
use diesel::prelude::*;
use time::OffsetDateTime;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::from_timestamp;
use crate::diesel_schema::admin_jobs;
use crate::error::PersistenceError;

backend_fn! {
/// Schedules a job and returns its id.
///
/// # Errors
///
/// Returns an error if the insert or payload serialization fails.
pub fn insert_admin_job(conn: &mut _, job: &AdminJob) -> Result<i64, PersistenceError> {
    let payload: String = serde_json::to_string(&job.payload)?;
    diesel::insert_into(admin_jobs::table)
        .values((
            admin_jobs::job_name.eq(&job.job_name),
            admin_jobs::payload.eq(payload),
            admin_jobs::execute_at.eq(from_timestamp(job.execute_at)),
            admin_jobs::status.eq(job.status.as_str()),
            admin_jobs::attempts.eq(i64::from(job.attempts)),
            admin_jobs::last_error.eq(job.last_error.as_deref()),
        ))
        .execute(conn)?;
    let job_id: i64 = conn.get_last_insert_rowid()?;
    info!(job_id, job_name = %job.job_name, "Scheduled admin job");
    Ok(job_id)
}
}

backend_fn! {
/// Records the outcome of a job run.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_admin_job(
    conn: &mut _,
    job_id: i64,
    status: AdminJobStatus,
    attempts: u32,
    execute_at: OffsetDateTime,
    last_error: Option<&str>,
) -> Result<(), PersistenceError> {
    diesel::update(admin_jobs::table.find(job_id))
        .set((
            admin_jobs::status.eq(status.as_str()),
            admin_jobs::attempts.eq(i64::from(attempts)),
            admin_jobs::execute_at.eq(from_timestamp(execute_at)),
            admin_jobs::last_error.eq(last_error),
        ))
        .execute(conn)?;
    Ok(())
}
}
