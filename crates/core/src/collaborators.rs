// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Contracts for the collaborators the reservation engine notifies.

use alfio_domain::{Discount, Reservation, Ticket};
use std::sync::Mutex;
use time::OffsetDateTime;

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Identifies what a notification is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContext {
    pub event_id: i64,
    pub organization_id: i64,
    /// Template or purpose, e.g. `reservation-confirmed`.
    pub kind: String,
}

/// Outgoing e-mail channel.
///
/// Sending is fire-and-forget: implementations log failures instead of
/// returning them.
pub trait NotificationSink: Send + Sync {
    /// Queues a plain e-mail.
    ///
    /// The body is produced lazily so that sinks which drop the message do
    /// not pay for rendering it.
    fn send_simple_email(
        &self,
        context: &NotificationContext,
        reservation_id: Option<&str>,
        recipient: &str,
        subject: &str,
        body: &dyn Fn() -> String,
        attachments: Vec<Attachment>,
    );
}

/// Extension points called at well-defined moments of the lifecycle.
///
/// Every hook has a no-op default.
pub trait ExtensionHooks: Send + Sync {
    /// A reservation has been confirmed. Called after commit.
    fn reservation_confirmed(&self, _reservation: &Reservation) {}

    /// Reservations of an event have expired.
    fn reservations_expired(&self, _event_id: i64, _reservation_ids: &[String]) {}

    /// Reservations have been cancelled by an organizer.
    fn reservations_cancelled(&self, _event_id: i64, _reservation_ids: &[String]) {}

    /// Reservations have been marked stuck.
    fn reservations_stuck(&self, _event_id: i64, _reservation_ids: &[String]) {}

    /// A ticket has been assigned to a holder.
    fn ticket_assigned(&self, _ticket: &Ticket) {}

    /// Overrides the invoice number of `reservation`.
    fn invoice_number(&self, _reservation: &Reservation) -> Option<String> {
        None
    }

    /// Creates a discount at runtime when the buyer supplied no code.
    fn dynamic_discount(
        &self,
        _event_id: i64,
        _category_quantities: &[(i64, u32)],
    ) -> Option<DynamicDiscount> {
        None
    }
}

/// A discount created by an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicDiscount {
    /// The code under which it is persisted.
    pub code: String,
    pub discount: Discount,
}

/// Extension hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtensionHooks;

impl ExtensionHooks for NoopExtensionHooks {}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: OffsetDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: time::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |guard| *guard)
    }
}
