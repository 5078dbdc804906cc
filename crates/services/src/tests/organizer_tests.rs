// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::{ServiceError, TicketLine, create_event};
use alfio::{CoreError, PaymentProvider, PaymentResult};
use alfio_domain::{
    DomainError, PaymentMethod, PaymentProxy, ReservationStatus, SpecialPrice,
    SpecialPriceStatus, TicketStatus,
};
use alfio_persistence::TicketPool;

#[test]
fn test_event_creation_generates_inventory() {
    let mut h = Harness::new();
    let created = h.setup(
        &test_event(10),
        &[category("Standard", true, 6, 10_000), category("Open", false, 0, 5_000)],
    );
    let mut store = h.persistence.store();
    let bounded = store
        .count_tickets(
            created.event_id,
            TicketPool::Category(created.category_ids[0]),
            &[TicketStatus::Free],
        )
        .unwrap();
    let shared = store
        .count_tickets(created.event_id, TicketPool::Unallocated, &[TicketStatus::Free])
        .unwrap();
    assert_eq!((bounded, shared), (6, 4));
}

#[test]
fn test_bounded_categories_cannot_exceed_capacity() {
    let mut persistence = alfio_persistence::Persistence::new_in_memory().unwrap();
    let result = create_event(
        &mut persistence,
        &test_event(5),
        &[category("A", true, 4, 1_000), category("B", true, 2, 1_000)],
    );
    assert_eq!(
        result,
        Err(ServiceError::Core(CoreError::DomainViolation(DomainError::CapacityExceeded {
            requested: 6,
            available: 5
        })))
    );
}

#[test]
fn test_cancel_releases_everything() {
    let mut h = Harness::new();
    let mut restricted = category("Sponsor", true, 2, 10_000);
    restricted.access_restricted = true;
    let created = h.setup(&test_event(2), &[restricted]);
    let (event_id, category_id) = (created.event_id, created.category_ids[0]);
    h.persistence
        .store()
        .insert_special_price(&SpecialPrice {
            id: 0,
            code: String::from("VIP"),
            category_id,
            price: 0,
            status: SpecialPriceStatus::Free,
            reservation_id: None,
            access_code_id: None,
        })
        .unwrap();
    let id = h
        .reserve(event_id, vec![TicketLine::new(category_id, 1).with_token("VIP")])
        .unwrap();
    h.set_customer(&id, "ada@example.org");

    h.manager
        .cancel_reservation(&mut h.persistence, &id, true, &admin())
        .unwrap();

    assert_eq!(h.reservation(&id).status, ReservationStatus::Cancelled);
    assert!(h.tickets(&id).is_empty());
    let mut store = h.persistence.store();
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free])
            .unwrap(),
        2
    );
    let token = store.special_price_by_code("VIP").unwrap().unwrap();
    assert_eq!(token.status, SpecialPriceStatus::Free);
    assert_eq!(token.reservation_id, None);
    drop(store);

    assert_eq!(*h.hooks.cancelled.lock().unwrap(), vec![id.clone()]);
    assert_eq!(h.mails.kinds(), vec![String::from("reservation-cancelled")]);

    // the token can be used again
    assert!(
        h.reserve(event_id, vec![TicketLine::new(category_id, 1).with_token("VIP")])
            .is_ok()
    );
}

#[test]
fn test_completed_reservation_cannot_be_cancelled() {
    let mut h = Harness::new();
    let (event_id, category_id) = h.setup_simple(2);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();
    assert!(h.pay(&id, &card()).is_successful());

    let result = h
        .manager
        .cancel_reservation(&mut h.persistence, &id, false, &admin());
    assert_eq!(
        result,
        Err(ServiceError::Core(CoreError::incompatible(&id, ReservationStatus::Complete)))
    );
    assert_eq!(h.reservation(&id).status, ReservationStatus::Complete);
}

#[test]
fn test_release_ticket_then_last_ticket() {
    let mut h = Harness::new();
    let (event_id, category_id) = h.setup_simple(3);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 2)]).unwrap();
    assert!(h.pay(&id, &card()).is_successful());
    let tickets = h.tickets(&id);

    h.manager
        .release_ticket(&mut h.persistence, &id, tickets[0].id, &admin())
        .unwrap();

    let reservation = h.reservation(&id);
    assert_eq!(reservation.status, ReservationStatus::Complete);
    assert_eq!(reservation.final_price, 10_000);
    assert_eq!(h.tickets(&id).len(), 1);
    let released = h.persistence.store().ticket(tickets[0].id).unwrap();
    assert_eq!(released.status, TicketStatus::Free);
    assert_eq!(released.category_id, Some(category_id));

    h.manager
        .release_ticket(&mut h.persistence, &id, tickets[1].id, &admin())
        .unwrap();
    assert_eq!(h.reservation(&id).status, ReservationStatus::Cancelled);
    assert!(h.tickets(&id).is_empty());
}

#[test]
fn test_release_ticket_outside_reservation() {
    let mut h = Harness::new();
    let (event_id, category_id) = h.setup_simple(3);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();
    let other = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();
    assert!(h.pay(&id, &card()).is_successful());
    let foreign = h.tickets(&other)[0].id;

    let result = h
        .manager
        .release_ticket(&mut h.persistence, &id, foreign, &admin());
    assert!(matches!(result, Err(ServiceError::Core(CoreError::NotFound { .. }))));
}

#[test]
fn test_release_ticket_of_restricted_category_is_refused() {
    let mut h = Harness::new();
    let mut restricted = category("Sponsor", true, 1, 10_000);
    restricted.access_restricted = true;
    let created = h.setup(&test_event(1), &[restricted]);
    let category_id = created.category_ids[0];
    h.persistence
        .store()
        .insert_special_price(&SpecialPrice {
            id: 0,
            code: String::from("VIP"),
            category_id,
            price: 0,
            status: SpecialPriceStatus::Free,
            reservation_id: None,
            access_code_id: None,
        })
        .unwrap();
    let id = h
        .reserve(created.event_id, vec![TicketLine::new(category_id, 1).with_token("VIP")])
        .unwrap();
    assert!(h.pay(&id, &card()).is_successful());
    let ticket_id = h.tickets(&id)[0].id;

    let result = h
        .manager
        .release_ticket(&mut h.persistence, &id, ticket_id, &admin());
    assert_eq!(
        result,
        Err(ServiceError::Core(CoreError::incompatible(&id, ReservationStatus::Complete)))
    );
}

#[test]
fn test_offline_processor_confirms_matched_transfers() {
    let mut h = Harness::new();
    h.manager.payments_mut().register(
        PaymentProvider::new(
            "bank-statements",
            PaymentProxy::Offline,
            vec![PaymentMethod::BankTransfer],
            |_| PaymentResult::failed("not a checkout provider"),
        )
        .with_offline_processor(|pending| {
            pending
                .iter()
                .filter(|r| r.final_price == 20_000)
                .map(|r| r.id.clone())
                .collect()
        }),
    );
    let (event_id, category_id) = h.setup_simple(5);
    let matched = h.reserve(event_id, vec![TicketLine::new(category_id, 2)]).unwrap();
    let unmatched = h.reserve(event_id, vec![TicketLine::new(category_id, 1)]).unwrap();
    assert!(h.pay(&matched, &bank_transfer()).is_successful());
    assert!(h.pay(&unmatched, &bank_transfer()).is_successful());

    let confirmed = h
        .manager
        .check_pending_offline_payments(&mut h.persistence, event_id)
        .unwrap();

    assert_eq!(confirmed, vec![matched.clone()]);
    assert_eq!(h.reservation(&matched).status, ReservationStatus::Complete);
    assert_eq!(h.reservation(&unmatched).status, ReservationStatus::OfflinePayment);
}

#[test]
fn test_total_cost_matches_stored_totals() {
    let mut h = Harness::new();
    let (event_id, category_id) = h.setup_simple(5);
    let id = h.reserve(event_id, vec![TicketLine::new(category_id, 3)]).unwrap();

    let total = h
        .manager
        .total_reservation_cost(&mut h.persistence, &id)
        .unwrap();
    let reservation = h.reservation(&id);
    assert_eq!(total.price_with_vat, reservation.final_price);
    assert_eq!(total.vat, reservation.vat);
    assert_eq!(total.src_price, 30_000);
}
