// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::AdminJobStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Job name used to retry the second finalization phase.
pub const FINALIZE_RESERVATION_JOB: &str = "finalize-reservation";

/// A deferred unit of work executed by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminJob {
    pub id: i64,
    pub job_name: String,
    pub payload: serde_json::Value,
    #[serde(with = "time::serde::timestamp")]
    pub execute_at: OffsetDateTime,
    pub status: AdminJobStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl AdminJob {
    /// Whether the job may be picked up at `now`.
    #[must_use]
    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        self.status == AdminJobStatus::Scheduled && self.execute_at <= now
    }
}
