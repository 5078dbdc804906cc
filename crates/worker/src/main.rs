// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod sweep;

use std::sync::Arc;
use std::time::Duration;

use alfio_persistence::{Persistence, PersistenceError};
use alfio_services::{ReservationSettings, ServiceContext, TicketReservationManager};
use clap::Parser;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::sweep::{Sweep, run_blocking, run_periodically};

/// alf.io worker - runs the periodic sweeps of the reservation engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// `MySQL` connection URL. Takes precedence over `--database`.
    #[cfg(feature = "mysql")]
    #[arg(long)]
    mysql_url: Option<String>,

    /// Seconds between expired reservation cleanups
    #[arg(long, default_value_t = 30)]
    expiry_interval: u64,

    /// Seconds between stuck payment checks
    #[arg(long, default_value_t = 60)]
    stuck_interval: u64,

    /// Seconds between waiting queue distributions
    #[arg(long, default_value_t = 30)]
    waiting_queue_interval: u64,

    /// Seconds between admin job runs
    #[arg(long, default_value_t = 5)]
    jobs_interval: u64,

    /// Minutes a pending reservation holds its seats
    #[arg(long, default_value_t = 25)]
    reservation_timeout: u32,

    /// Working days granted to pay by bank transfer
    #[arg(long, default_value_t = 5)]
    offline_payment_days: u32,

    /// Deliver tickets before the bank transfer arrives
    #[arg(long)]
    deferred_offline_payment: bool,

    /// Minutes a payment may stay in progress past the reservation validity
    #[arg(long, default_value_t = 10)]
    stuck_grace_period: u32,

    /// Recipient of organizer notifications
    #[arg(long, default_value = "organizer@localhost")]
    organizer_email: String,

    /// Run every sweep once and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn settings(&self) -> ReservationSettings {
        ReservationSettings {
            reservation_timeout: time::Duration::minutes(i64::from(self.reservation_timeout)),
            offline_payment_days: self.offline_payment_days,
            deferred_offline_payment: self.deferred_offline_payment,
            stuck_grace_period: time::Duration::minutes(i64::from(self.stuck_grace_period)),
            organizer_email: self.organizer_email.clone(),
            ..ReservationSettings::default()
        }
    }

    const fn interval(&self, sweep: Sweep) -> Duration {
        let secs = match sweep {
            Sweep::ExpiredReservations => self.expiry_interval,
            Sweep::StuckReservations => self.stuck_interval,
            Sweep::WaitingQueue => self.waiting_queue_interval,
            Sweep::AdminJobs => self.jobs_interval,
        };
        // tokio rejects a zero period
        Duration::from_secs(if secs == 0 { 1 } else { secs })
    }

    fn open_persistence(&self) -> Result<Persistence, PersistenceError> {
        #[cfg(feature = "mysql")]
        if let Some(url) = &self.mysql_url {
            info!("Using MySQL database");
            return Persistence::new_with_mysql(url);
        }
        if let Some(db_path) = &self.database {
            info!("Using file-based database at: {}", db_path);
            Persistence::new_with_file(db_path)
        } else {
            warn!("Using in-memory database, nothing will survive a restart");
            Persistence::new_in_memory()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing alf.io worker");

    let persistence = Arc::new(Mutex::new(args.open_persistence()?));
    let manager = Arc::new(TicketReservationManager::new(ServiceContext::new(
        args.settings(),
    )));

    if args.once {
        for sweep in Sweep::ALL {
            run_blocking(sweep, Arc::clone(&manager), Arc::clone(&persistence)).await;
        }
        info!("All sweeps ran once");
        return Ok(());
    }

    let mut tasks = JoinSet::new();
    for sweep in Sweep::ALL {
        tasks.spawn(run_periodically(
            sweep,
            args.interval(sweep),
            Arc::clone(&manager),
            Arc::clone(&persistence),
        ));
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    tasks.shutdown().await;
    Ok(())
}
