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
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

//! Managers orchestrating reservations over the store.
//!
//! Managers own no connection: every operation borrows a
//! [`Persistence`](alfio_persistence::Persistence) for its duration and opens
//! its own transactions on it.

mod allocator;
mod allowlist;
mod billing;
mod context;
mod error;
mod event_setup;
mod finalizer;
mod jobs;
mod lifecycle;
mod notification;
mod payment;
mod promo_code;
mod request;
mod reservation;
mod settings;
mod waiting_queue;

#[cfg(test)]
mod tests;

pub use allowlist::GroupManager;
pub use billing::BillingDocumentManager;
pub use context::ServiceContext;
pub use error::ServiceError;
pub use event_setup::{CreatedEvent, create_event};
pub use finalizer::{FinalizeOutcome, FinalizePayload, ReservationFinalizer};
pub use jobs::{AdminJobManager, JobRunSummary};
pub use notification::TracingNotificationSink;
pub use payment::{
    BANK_TRANSFER_PROVIDER, ON_SITE_PROVIDER, PaymentManager, bank_transfer_provider, codes,
    on_site_provider,
};
pub use promo_code::{PromoCodeManager, USAGE_COUNTED_STATUSES};
pub use request::{
    AdditionalServiceLine, AttendeeAssignment, CustomerUpdate, PaymentRequest, ReservationRequest,
    TicketLine,
};
pub use reservation::TicketReservationManager;
pub use settings::ReservationSettings;
pub use waiting_queue::{DistributionSummary, SubscriptionRequest, WaitingQueueManager};
