// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tunables of the reservation engine.

use alfio_domain::{InvoiceNumberFormat, ReverseChargeConfig, WorkingPeriod};
use time::Duration;

/// Engine-wide settings.
///
/// Every field has a default suitable for production; the worker overrides
/// some of them from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationSettings {
    /// How long a PENDING reservation holds its seats.
    pub reservation_timeout: Duration,
    /// Working days granted to pay by bank transfer.
    pub offline_payment_days: u32,
    /// Bank transfers are accepted after the tickets have been delivered.
    pub deferred_offline_payment: bool,
    /// How long a payment may stay in progress past the reservation validity.
    pub stuck_grace_period: Duration,
    /// Nominal validity of a seat offered to a waiting-queue subscriber.
    pub waiting_queue_timeout_hours: u32,
    /// Working hours used to push offer expirations out of nights and weekends.
    pub working_period: WorkingPeriod,
    /// Pre-reserved seats are offered once the first category opens within this window.
    pub pre_sales_window: Duration,
    /// Delay before a failed finalization is retried.
    pub finalize_retry_delay: Duration,
    /// Attempts before an admin job is abandoned.
    pub job_max_attempts: u32,
    /// Jobs claimed per sweep.
    pub job_batch_size: u32,
    pub invoice_format: InvoiceNumberFormat,
    pub reverse_charge: ReverseChargeConfig,
    /// Recipient of organizer notifications.
    pub organizer_email: String,
    /// Entries kept in the per-event payment method cache.
    pub payment_cache_capacity: usize,
    /// Lifetime of a cached payment method list.
    pub payment_cache_ttl: std::time::Duration,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            reservation_timeout: Duration::minutes(25),
            offline_payment_days: 5,
            deferred_offline_payment: false,
            stuck_grace_period: Duration::minutes(10),
            waiting_queue_timeout_hours: 4,
            working_period: WorkingPeriod::default(),
            pre_sales_window: Duration::minutes(5),
            finalize_retry_delay: Duration::seconds(2),
            job_max_attempts: 5,
            job_batch_size: 20,
            invoice_format: InvoiceNumberFormat::default(),
            reverse_charge: ReverseChargeConfig::default(),
            organizer_email: String::from("organizer@localhost"),
            payment_cache_capacity: 128,
            payment_cache_ttl: std::time::Duration::from_secs(60),
        }
    }
}
