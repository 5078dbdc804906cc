// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::TicketPool;
use alfio::{Command, apply};
use alfio_audit::{Actor, ActorKind, AuditEventType, Cause};
use alfio_domain::TicketStatus;
use time::macros::datetime;

#[test]
fn test_reservation_round_trip_and_update() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, _) = seed_bounded_event(&mut persistence, 1);
    let mut store = persistence.store();

    let mut reservation = create_test_reservation("res-1", event_id);
    store.insert_reservation(&reservation).unwrap();
    assert_eq!(store.reservation("res-1").unwrap(), reservation);

    reservation.status = ReservationStatus::InPayment;
    reservation.payment_proxy = Some(PaymentProxy::Stripe);
    reservation.invoice_number = Some(String::from("INV-001"));
    reservation.customer.email = Some(String::from("ada@example.org"));
    reservation.billing.invoice_requested = true;
    store.update_reservation(&reservation).unwrap();
    assert_eq!(store.lock_reservation("res-1").unwrap(), reservation);

    reservation.invoice_number = None;
    store.update_reservation(&reservation).unwrap();
    assert_eq!(store.reservation("res-1").unwrap().invoice_number, None);
}

#[test]
fn test_update_unknown_reservation_is_not_found() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let result = persistence
        .store()
        .update_reservation(&create_test_reservation("missing", 1));
    assert!(matches!(
        result,
        Err(PersistenceError::NotFound {
            entity: "reservation",
            ..
        })
    ));
}

#[test]
fn test_failed_transaction_leaves_nothing_behind() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 2);

    let result: Result<(), PersistenceError> = persistence.transaction(|store| {
        store.insert_reservation(&create_test_reservation("res-1", event_id))?;
        let ids = store.lock_tickets(
            event_id,
            TicketPool::Category(category_id),
            &[TicketStatus::Free],
            2,
        )?;
        store.reserve_tickets(&ids, "res-1", category_id, 10_000, "en")?;
        Err(PersistenceError::QueryFailed(String::from("boom")))
    });
    assert!(result.is_err());

    let mut store = persistence.store();
    assert!(store.reservation("res-1").is_err());
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free])
            .unwrap(),
        2
    );
}

#[test]
fn test_expired_reservations_query() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, _) = seed_bounded_event(&mut persistence, 1);
    let mut store = persistence.store();

    let mut expired = create_test_reservation("old", event_id);
    expired.validity = datetime!(2026-03-02 09:00 UTC);
    store.insert_reservation(&expired).unwrap();
    store
        .insert_reservation(&create_test_reservation("fresh", event_id))
        .unwrap();
    let mut paying = create_test_reservation("paying", event_id);
    paying.validity = datetime!(2026-03-02 09:00 UTC);
    paying.status = ReservationStatus::InPayment;
    store.insert_reservation(&paying).unwrap();

    let found = store
        .reservations_expired_before(&[ReservationStatus::Pending], NOW)
        .unwrap();
    assert_eq!(
        found.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["old"]
    );

    let pending = store
        .reservations_by_status(event_id, &[ReservationStatus::Pending])
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.status == ReservationStatus::Pending));
}

#[test]
fn test_promo_code_usage_counts_tickets_of_counted_statuses() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 4);
    let mut store = persistence.store();
    let promo = alfio_domain::PromoCodeDiscount {
        id: 0,
        code: String::from("SAVE10"),
        event_id: Some(event_id),
        organization_id: 1,
        code_type: alfio_domain::CodeType::Discount,
        discount_type: alfio_domain::DiscountType::Percentage,
        discount_amount: 10,
        categories: vec![],
        hidden_category_id: None,
        max_usage: Some(1),
        valid_from: datetime!(2026-01-01 00:00 UTC),
        valid_to: datetime!(2026-12-31 00:00 UTC),
    };
    let promo_id = store.insert_promo_code(&promo).unwrap();

    for (id, status) in [
        ("done", ReservationStatus::Complete),
        ("cart", ReservationStatus::Pending),
    ] {
        let mut reservation = create_test_reservation(id, event_id);
        reservation.status = status;
        reservation.promo_code_id = Some(promo_id);
        store.insert_reservation(&reservation).unwrap();
        let ids = store
            .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 1)
            .unwrap();
        store.reserve_tickets(&ids, id, category_id, 10_000, "en").unwrap();
    }

    let counted = [ReservationStatus::InPayment, ReservationStatus::Complete];
    assert_eq!(
        store.count_promo_code_usage(promo_id, &counted, "cart").unwrap(),
        1
    );
    assert_eq!(
        store.count_promo_code_usage(promo_id, &counted, "done").unwrap(),
        0
    );
}

#[test]
fn test_transition_audit_round_trip() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, _) = seed_bounded_event(&mut persistence, 1);
    let mut store = persistence.store();
    store
        .insert_reservation(&create_test_reservation("res-1", event_id))
        .unwrap();

    let state = alfio::ReservationState::pending(String::from("res-1"), event_id);
    let actor = Actor::new(String::from("buyer@example.org"), ActorKind::Customer);
    let cause = Cause::new(String::from("req-1"), String::from("Checkout"));
    let result = apply(&state, Command::Create, actor, cause).unwrap();
    store.record_transition(&result, NOW).unwrap();

    let events = store.audit_events("res-1").unwrap();
    assert_eq!(events, vec![result.audit_event]);
    assert_eq!(events[0].event_type, AuditEventType::ReservationCreate);
}
