// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The periodic maintenance passes of the reservation engine.
//!
//! Each sweep is a plain blocking call into the managers. The worker runs
//! them on the blocking pool, one at a time per database connection.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alfio_persistence::Persistence;
use alfio_services::{ServiceError, TicketReservationManager};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// A maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Cancels reservations whose hold or transfer deadline has passed.
    ExpiredReservations,
    /// Flags payments that never came back.
    StuckReservations,
    /// Offers freed seats to waiting-queue subscribers.
    WaitingQueue,
    /// Retries failed finalizations.
    AdminJobs,
}

impl Sweep {
    pub const ALL: [Self; 4] = [
        Self::ExpiredReservations,
        Self::StuckReservations,
        Self::WaitingQueue,
        Self::AdminJobs,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExpiredReservations => "expired-reservations",
            Self::StuckReservations => "stuck-reservations",
            Self::WaitingQueue => "waiting-queue",
            Self::AdminJobs => "admin-jobs",
        }
    }

    /// Runs the pass once and returns how many rows it acted on.
    ///
    /// # Errors
    ///
    /// Returns the manager's error when the pass could not even list its
    /// candidates. Per-reservation failures are logged by the managers.
    pub fn run(
        self,
        manager: &TicketReservationManager,
        persistence: &mut Persistence,
    ) -> Result<usize, ServiceError> {
        match self {
            Self::ExpiredReservations => manager.cleanup_expired_reservations(persistence),
            Self::StuckReservations => manager.mark_stuck_reservations(persistence),
            Self::WaitingQueue => manager
                .waiting_queue()
                .distribute_all(persistence)
                .map(|summary| summary.offered + summary.reverted + summary.pre_reserved),
            Self::AdminJobs => manager
                .process_admin_jobs(persistence)
                .map(|summary| summary.executed + summary.rescheduled + summary.failed),
        }
    }
}

impl fmt::Display for Sweep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `sweep` on the blocking pool and logs the outcome.
pub async fn run_blocking(
    sweep: Sweep,
    manager: Arc<TicketReservationManager>,
    persistence: Arc<Mutex<Persistence>>,
) -> Option<usize> {
    let outcome = tokio::task::spawn_blocking(move || {
        let mut persistence = persistence.blocking_lock();
        sweep.run(&manager, &mut persistence)
    })
    .await;

    match outcome {
        Ok(Ok(count)) => {
            if count > 0 {
                info!(%sweep, count, "Sweep finished");
            } else {
                debug!(%sweep, "Sweep found nothing to do");
            }
            Some(count)
        }
        Ok(Err(err)) => {
            error!(%sweep, error = %err, code = err.error_code(), "Sweep failed");
            None
        }
        Err(err) => {
            error!(%sweep, error = %err, "Sweep task aborted");
            None
        }
    }
}

/// Runs `sweep` every `every` until the task is cancelled.
///
/// A pass that overruns its interval delays the next one instead of
/// bunching up.
pub async fn run_periodically(
    sweep: Sweep,
    every: Duration,
    manager: Arc<TicketReservationManager>,
    persistence: Arc<Mutex<Persistence>>,
) {
    info!(%sweep, interval_secs = every.as_secs(), "Sweep scheduled");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        run_blocking(sweep, Arc::clone(&manager), Arc::clone(&persistence)).await;
    }
}
