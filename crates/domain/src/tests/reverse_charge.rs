// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    BillingDetails, CategoryAccessType, CategoryStatus, Event, EventFormat, PaymentProxy,
    ReverseCharge, ReverseChargeConfig, TicketCategory, VatRate, VatStatus, category_vat_status,
    evaluate_reverse_charge, is_eu_country, reservation_vat_status,
};
use time::macros::datetime;

fn create_test_event(format: EventFormat, vat_status: VatStatus) -> Event {
    Event {
        id: 1,
        short_name: String::from("devconf"),
        organization_id: 1,
        format,
        currency: String::from("EUR"),
        available_seats: 100,
        vat_status,
        vat_rate: VatRate::from_basis_points(2200),
        time_zone: String::from("Europe/Rome"),
        begin: datetime!(2026-09-01 08:00 UTC),
        end: datetime!(2026-09-02 18:00 UTC),
        allowed_payment_proxies: vec![PaymentProxy::Stripe],
        waiting_queue_enabled: false,
        pre_registration_enabled: false,
        organizer_country: Some(String::from("IT")),
    }
}

fn create_test_category(access_type: CategoryAccessType) -> TicketCategory {
    TicketCategory {
        id: 1,
        event_id: 1,
        name: String::from("standard"),
        bounded: false,
        max_tickets: 0,
        src_price: 10_000,
        access_restricted: false,
        inception: datetime!(2026-01-01 00:00 UTC),
        expiration: datetime!(2026-09-01 00:00 UTC),
        ordinal: 0,
        access_type,
        status: CategoryStatus::Active,
        blacklisted_payment_methods: vec![],
    }
}

fn create_test_business(country: &str) -> BillingDetails {
    BillingDetails {
        company_name: Some(String::from("ACME GmbH")),
        address: Some(String::from("Hauptstrasse 1")),
        vat_number: Some(String::from("DE123456789")),
        country: Some(String::from(country)),
        invoice_requested: true,
        vat_number_validated: true,
    }
}

const BOTH: ReverseChargeConfig = ReverseChargeConfig {
    in_person: true,
    online: true,
};

#[test]
fn test_eu_country_lookup() {
    assert!(is_eu_country("de"));
    assert!(is_eu_country("EL"));
    assert!(!is_eu_country("CH"));
}

#[test]
fn test_full_reverse_charge_makes_reservation_exempt() {
    let event = create_test_event(EventFormat::InPerson, VatStatus::NotIncluded);
    let outcome = evaluate_reverse_charge(&event, &create_test_business("DE"), BOTH);
    assert_eq!(outcome, ReverseCharge::Full(VatStatus::NotIncludedExempt));
    assert_eq!(
        reservation_vat_status(&event, outcome),
        VatStatus::NotIncludedExempt
    );
}

#[test]
fn test_same_country_is_not_reverse_charged() {
    let event = create_test_event(EventFormat::InPerson, VatStatus::Included);
    let outcome = evaluate_reverse_charge(&event, &create_test_business("IT"), BOTH);
    assert_eq!(outcome, ReverseCharge::NotApplicable);
}

#[test]
fn test_non_eu_buyer_is_not_reverse_charged() {
    let event = create_test_event(EventFormat::InPerson, VatStatus::Included);
    let outcome = evaluate_reverse_charge(&event, &create_test_business("CH"), BOTH);
    assert_eq!(outcome, ReverseCharge::NotApplicable);
}

#[test]
fn test_unvalidated_vat_number_is_not_reverse_charged() {
    let event = create_test_event(EventFormat::InPerson, VatStatus::Included);
    let mut billing = create_test_business("DE");
    billing.vat_number_validated = false;
    assert_eq!(
        evaluate_reverse_charge(&event, &billing, BOTH),
        ReverseCharge::NotApplicable
    );
}

#[test]
fn test_partial_reverse_charge_only_touches_matching_categories() {
    let event = create_test_event(EventFormat::Hybrid, VatStatus::Included);
    let config = ReverseChargeConfig {
        in_person: false,
        online: true,
    };
    let outcome = evaluate_reverse_charge(&event, &create_test_business("DE"), config);
    assert_eq!(outcome, ReverseCharge::Partial(EventFormat::Online));

    let online = create_test_category(CategoryAccessType::Online);
    let in_person = create_test_category(CategoryAccessType::InPerson);
    assert_eq!(
        category_vat_status(&event, &online, outcome),
        VatStatus::IncludedNotCharged
    );
    assert_eq!(
        category_vat_status(&event, &in_person, outcome),
        VatStatus::Included
    );
    assert_eq!(reservation_vat_status(&event, outcome), VatStatus::Included);
}

#[test]
fn test_partial_config_on_single_format_event_covering_it_is_full() {
    let event = create_test_event(EventFormat::Online, VatStatus::Included);
    let config = ReverseChargeConfig {
        in_person: false,
        online: true,
    };
    let outcome = evaluate_reverse_charge(&event, &create_test_business("FR"), config);
    assert_eq!(outcome, ReverseCharge::Full(VatStatus::IncludedExempt));
    let inherit = create_test_category(CategoryAccessType::Inherit);
    assert_eq!(
        category_vat_status(&event, &inherit, outcome),
        VatStatus::IncludedExempt
    );
}

#[test]
fn test_event_without_vat_is_untouched() {
    let event = create_test_event(EventFormat::InPerson, VatStatus::None);
    let outcome = evaluate_reverse_charge(&event, &create_test_business("DE"), BOTH);
    assert_eq!(outcome, ReverseCharge::NotApplicable);
}
