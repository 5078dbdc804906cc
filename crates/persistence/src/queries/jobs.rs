// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Admin job queue queries.

use alfio_domain::{AdminJob, AdminJobStatus};
use diesel::prelude::*;
use time::OffsetDateTime;

use crate::data_models::{AdminJobRow, from_timestamp};
use crate::diesel_schema::admin_jobs;
use crate::error::PersistenceError;

backend_fn! {
/// Loads the jobs with a given name, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_jobs_by_name(conn: &mut _, job_name: &str) -> Result<Vec<AdminJob>, PersistenceError> {
    admin_jobs::table
        .filter(admin_jobs::job_name.eq(job_name))
        .order(admin_jobs::id.asc())
        .select(AdminJobRow::as_select())
        .load(conn)?
        .into_iter()
        .map(AdminJob::try_from)
        .collect()
}
}

/// Claims up to `limit` scheduled jobs due at `now`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_due_jobs_sqlite(
    conn: &mut diesel::SqliteConnection,
    now: OffsetDateTime,
    limit: u32,
) -> Result<Vec<AdminJob>, PersistenceError> {
    admin_jobs::table
        .filter(admin_jobs::status.eq(AdminJobStatus::Scheduled.as_str()))
        .filter(admin_jobs::execute_at.le(from_timestamp(now)))
        .order((admin_jobs::execute_at.asc(), admin_jobs::id.asc()))
        .limit(i64::from(limit))
        .select(AdminJobRow::as_select())
        .load(conn)?
        .into_iter()
        .map(AdminJob::try_from)
        .collect()
}

/// Claims up to `limit` scheduled jobs due at `now`, skipping jobs another
/// worker holds.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_due_jobs_mysql(
    conn: &mut diesel::MysqlConnection,
    now: OffsetDateTime,
    limit: u32,
) -> Result<Vec<AdminJob>, PersistenceError> {
    admin_jobs::table
        .filter(admin_jobs::status.eq(AdminJobStatus::Scheduled.as_str()))
        .filter(admin_jobs::execute_at.le(from_timestamp(now)))
        .order((admin_jobs::execute_at.asc(), admin_jobs::id.asc()))
        .limit(i64::from(limit))
        .select(AdminJobRow::as_select())
        .for_update()
        .skip_locked()
        .load(conn)?
        .into_iter()
        .map(AdminJob::try_from)
        .collect()
}
