// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Events and their ticket categories.

use crate::error::DomainError;
use crate::types::{
    CategoryAccessType, CategoryStatus, EventFormat, PaymentMethod, PaymentProxy, VatRate,
    VatStatus,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An event offering tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub short_name: String,
    pub organization_id: i64,
    pub format: EventFormat,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Total seats of the event, bounded and unbounded categories together.
    pub available_seats: u32,
    pub vat_status: VatStatus,
    pub vat_rate: VatRate,
    /// IANA time zone name, e.g. `Europe/Zurich`.
    pub time_zone: String,
    #[serde(with = "time::serde::timestamp")]
    pub begin: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub end: OffsetDateTime,
    pub allowed_payment_proxies: Vec<PaymentProxy>,
    pub waiting_queue_enabled: bool,
    pub pre_registration_enabled: bool,
    /// ISO country code of the organizer, used for reverse charge.
    pub organizer_country: Option<String>,
}

impl Event {
    /// Parses the event's time zone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTimezone` if the name is unknown.
    pub fn zone(&self) -> Result<Tz, DomainError> {
        self.time_zone
            .parse()
            .map_err(|_| DomainError::InvalidTimezone(self.time_zone.clone()))
    }

    /// Whether the event has already started.
    #[must_use]
    pub fn has_started(&self, now: OffsetDateTime) -> bool {
        self.begin <= now
    }

    /// Whether `proxy` is enabled for the event.
    #[must_use]
    pub fn allows_proxy(&self, proxy: PaymentProxy) -> bool {
        self.allowed_payment_proxies.contains(&proxy)
    }
}

/// A ticket category within an event.
///
/// Bounded categories own a fixed number of ticket rows; unbounded ones
/// draw from the event-wide pool of tickets without a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCategory {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub bounded: bool,
    pub max_tickets: u32,
    /// List price in cents.
    pub src_price: i64,
    /// Only reachable through a special price token or an access code.
    pub access_restricted: bool,
    #[serde(with = "time::serde::timestamp")]
    pub inception: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub expiration: OffsetDateTime,
    pub ordinal: i32,
    pub access_type: CategoryAccessType,
    pub status: CategoryStatus,
    pub blacklisted_payment_methods: Vec<PaymentMethod>,
}

impl TicketCategory {
    /// Whether the category is on sale at `now`.
    #[must_use]
    pub fn is_on_sale(&self, now: OffsetDateTime) -> bool {
        self.status == CategoryStatus::Active && self.inception <= now && now < self.expiration
    }

    /// Whether the category has been disabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CategoryStatus::Active
    }

    /// Whether `method` is blacklisted for this category.
    #[must_use]
    pub fn blacklists(&self, method: PaymentMethod) -> bool {
        self.blacklisted_payment_methods.contains(&method)
    }

    /// Attendance format of the category, resolving `INHERIT`.
    #[must_use]
    pub const fn effective_format(&self, event_format: EventFormat) -> EventFormat {
        match self.access_type {
            CategoryAccessType::Inherit => event_format,
            CategoryAccessType::InPerson => EventFormat::InPerson,
            CategoryAccessType::Online => EventFormat::Online,
        }
    }
}

/// Seats still available in an event or a bounded category.
///
/// `capacity` is the configured number of seats; `taken` counts tickets that
/// are neither FREE nor RELEASED nor PRE_RESERVED.
#[must_use]
pub const fn available_seats(capacity: u32, taken: u32) -> u32 {
    capacity.saturating_sub(taken)
}

/// Picks the unbounded category that closes first among those on sale.
///
/// Used when a waiting-queue subscriber has no category and the released
/// ticket carries none either.
#[must_use]
pub fn first_expiring_unbounded(
    categories: &[TicketCategory],
    now: OffsetDateTime,
) -> Option<&TicketCategory> {
    categories
        .iter()
        .filter(|c| !c.bounded && !c.access_restricted && c.is_on_sale(now))
        .min_by_key(|c| (c.expiration, c.ordinal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn category(id: i64, bounded: bool, expiration: OffsetDateTime) -> TicketCategory {
        TicketCategory {
            id,
            event_id: 1,
            name: format!("cat-{id}"),
            bounded,
            max_tickets: 10,
            src_price: 1000,
            access_restricted: false,
            inception: datetime!(2026-01-01 00:00 UTC),
            expiration,
            ordinal: 0,
            access_type: CategoryAccessType::Inherit,
            status: CategoryStatus::Active,
            blacklisted_payment_methods: vec![PaymentMethod::BankTransfer],
        }
    }

    #[test]
    fn test_on_sale_window() {
        let cat = category(1, true, datetime!(2026-06-01 00:00 UTC));
        assert!(cat.is_on_sale(datetime!(2026-03-01 00:00 UTC)));
        assert!(!cat.is_on_sale(datetime!(2025-12-31 00:00 UTC)));
        assert!(!cat.is_on_sale(datetime!(2026-06-01 00:00 UTC)));
    }

    #[test]
    fn test_effective_format_resolves_inherit() {
        let mut cat = category(1, true, datetime!(2026-06-01 00:00 UTC));
        assert_eq!(cat.effective_format(EventFormat::Hybrid), EventFormat::Hybrid);
        cat.access_type = CategoryAccessType::Online;
        assert_eq!(cat.effective_format(EventFormat::Hybrid), EventFormat::Online);
    }

    #[test]
    fn test_first_expiring_unbounded_skips_bounded() {
        let now = datetime!(2026-03-01 00:00 UTC);
        let early = datetime!(2026-04-01 00:00 UTC);
        let categories = vec![
            category(1, true, early),
            category(2, false, early + Duration::days(10)),
            category(3, false, early + Duration::days(5)),
        ];
        let chosen = first_expiring_unbounded(&categories, now).map(|c| c.id);
        assert_eq!(chosen, Some(3));
    }

    #[test]
    fn test_available_seats_saturates() {
        assert_eq!(available_seats(10, 4), 6);
        assert_eq!(available_seats(2, 5), 0);
    }

    #[test]
    fn test_blacklist() {
        let cat = category(1, true, datetime!(2026-06-01 00:00 UTC));
        assert!(cat.blacklists(PaymentMethod::BankTransfer));
        assert!(!cat.blacklists(PaymentMethod::CreditCard));
    }
}
