// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

#[cfg(feature = "mysql")]
mod backend_validation_tests;
mod concurrency_tests;
mod initialization_tests;
mod inventory_tests;
mod reservation_tests;

use crate::{Persistence, PersistenceError};
use alfio_domain::{
    BillingDetails, CategoryAccessType, CategoryStatus, CustomerDetails, Event, EventFormat,
    PaymentProxy, Reservation, ReservationStatus, SubscriptionType, TicketCategory, VatRate,
    VatStatus, WaitingQueueStatus, WaitingQueueSubscription,
};
use time::{Duration, OffsetDateTime};
use time::macros::datetime;

pub const NOW: OffsetDateTime = datetime!(2026-03-02 10:00 UTC);

pub fn create_test_event(short_name: &str) -> Event {
    Event {
        id: 0,
        short_name: short_name.to_string(),
        organization_id: 1,
        format: EventFormat::InPerson,
        currency: String::from("CHF"),
        available_seats: 10,
        vat_status: VatStatus::Included,
        vat_rate: VatRate::from_basis_points(770),
        time_zone: String::from("Europe/Zurich"),
        begin: datetime!(2026-06-01 09:00 UTC),
        end: datetime!(2026-06-02 18:00 UTC),
        allowed_payment_proxies: vec![PaymentProxy::Stripe, PaymentProxy::Offline],
        waiting_queue_enabled: false,
        pre_registration_enabled: false,
        organizer_country: Some(String::from("CH")),
    }
}

pub fn create_test_category(event_id: i64, bounded: bool, max_tickets: u32) -> TicketCategory {
    TicketCategory {
        id: 0,
        event_id,
        name: if bounded {
            String::from("Standard")
        } else {
            String::from("Open")
        },
        bounded,
        max_tickets,
        src_price: 10_000,
        access_restricted: false,
        inception: datetime!(2026-01-01 00:00 UTC),
        expiration: datetime!(2026-05-31 00:00 UTC),
        ordinal: 0,
        access_type: CategoryAccessType::Inherit,
        status: CategoryStatus::Active,
        blacklisted_payment_methods: vec![],
    }
}

pub fn create_test_reservation(id: &str, event_id: i64) -> Reservation {
    Reservation {
        id: id.to_string(),
        event_id,
        status: ReservationStatus::Pending,
        validity: datetime!(2026-03-02 10:25 UTC),
        created_at: NOW,
        confirmed_at: None,
        currency: String::from("CHF"),
        vat_status: VatStatus::Included,
        vat_rate: VatRate::from_basis_points(770),
        src_price: 0,
        final_price: 0,
        vat: 0,
        discount: 0,
        promo_code_id: None,
        invoice_number: None,
        payment_proxy: None,
        customer: CustomerDetails::default(),
        billing: BillingDetails::default(),
        language: String::from("en"),
        ready_for_confirmation: false,
        finalized: false,
    }
}

/// Creates an event with one bounded category holding `seats` FREE tickets.
///
/// Returns `(event_id, category_id)`.
pub fn seed_bounded_event(persistence: &mut Persistence, seats: u32) -> (i64, i64) {
    persistence
        .transaction(|store| {
            let event_id = store.insert_event(&create_test_event("conf-2026"))?;
            let category_id = store.insert_category(&create_test_category(event_id, true, seats))?;
            store.insert_tickets(
                event_id,
                Some(category_id),
                seats,
                10_000,
                VatStatus::Included,
                "CHF",
            )?;
            Ok::<_, PersistenceError>((event_id, category_id))
        })
        .expect("seed event")
}

pub fn create_test_subscription(event_id: i64, email: &str, minute: u8) -> WaitingQueueSubscription {
    WaitingQueueSubscription {
        id: 0,
        event_id,
        full_name: String::from("Waiting Person"),
        email: email.to_string(),
        language: String::from("en"),
        selected_category_id: None,
        subscription_type: SubscriptionType::SoldOut,
        status: WaitingQueueStatus::Waiting,
        reservation_id: None,
        created_at: NOW + Duration::minutes(i64::from(minute)),
    }
}
