// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::TicketPool;
use alfio_domain::{PriceBreakdown, TicketHolder, TicketStatus};

#[test]
fn test_lock_tickets_respects_limit_and_status() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 3);

    let mut store = persistence.store();
    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 2)
        .unwrap();
    assert_eq!(ids.len(), 2);

    let released = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Released], 2)
        .unwrap();
    assert!(released.is_empty());
}

#[test]
fn test_count_available_tickets_follows_the_category_pool() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 3);
    let mut store = persistence.store();
    let open_id = store
        .insert_category(&create_test_category(event_id, false, 0))
        .unwrap();
    store
        .insert_tickets(event_id, None, 4, 0, VatStatus::Included, "CHF")
        .unwrap();
    store
        .insert_reservation(&create_test_reservation("res-1", event_id))
        .unwrap();
    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 2)
        .unwrap();
    store
        .reserve_tickets(&ids, "res-1", category_id, 10_000, "en")
        .unwrap();

    let bounded = store.category(category_id).unwrap();
    let open = store.category(open_id).unwrap();
    assert_eq!(TicketPool::of(&bounded), TicketPool::Category(category_id));
    assert_eq!(TicketPool::of(&open), TicketPool::Unallocated);
    assert_eq!(store.count_available_tickets(&bounded).unwrap(), 1);
    assert_eq!(store.count_available_tickets(&open).unwrap(), 4);
}

#[test]
fn test_reserve_tickets_never_rebinds_a_held_ticket() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 2);
    let mut store = persistence.store();
    for id in ["res-1", "res-2"] {
        store
            .insert_reservation(&create_test_reservation(id, event_id))
            .unwrap();
    }
    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 1)
        .unwrap();
    assert_eq!(
        store.reserve_tickets(&ids, "res-1", category_id, 10_000, "en").unwrap(),
        1
    );

    // a stale claim on the same row binds nothing
    assert_eq!(
        store.reserve_tickets(&ids, "res-2", category_id, 10_000, "en").unwrap(),
        0
    );
    assert_eq!(store.tickets_by_reservation("res-1").unwrap().len(), 1);
    assert!(store.tickets_by_reservation("res-2").unwrap().is_empty());

    // RELEASED rows can be claimed again
    store.release_tickets(&ids, TicketStatus::Released).unwrap();
    assert_eq!(
        store.reserve_tickets(&ids, "res-2", category_id, 10_000, "en").unwrap(),
        1
    );
}

#[test]
fn test_reserve_and_price_tickets() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 3);
    let mut store = persistence.store();
    store
        .insert_reservation(&create_test_reservation("res-1", event_id))
        .unwrap();

    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 2)
        .unwrap();
    store
        .reserve_tickets(&ids, "res-1", category_id, 10_000, "de")
        .unwrap();
    let price = PriceBreakdown {
        src_price: 10_000,
        discount: 1_000,
        vat: 643,
        final_price: 9_000,
    };
    store
        .update_ticket_prices("res-1", category_id, &price, VatStatus::Included)
        .unwrap();

    let tickets = store.tickets_by_reservation("res-1").unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t.status == TicketStatus::Pending));
    assert!(tickets.iter().all(|t| t.price() == price));
    assert!(tickets.iter().all(|t| t.user_language.as_deref() == Some("de")));
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free])
            .unwrap(),
        1
    );
}

#[test]
fn test_release_returns_unbounded_tickets_to_the_pool() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut store = persistence.store();
    let event_id = store.insert_event(&create_test_event("pool")).unwrap();
    let open = store
        .insert_category(&create_test_category(event_id, false, 0))
        .unwrap();
    store
        .insert_tickets(event_id, None, 2, 0, VatStatus::Included, "CHF")
        .unwrap();
    store
        .insert_reservation(&create_test_reservation("res-1", event_id))
        .unwrap();

    let ids = store
        .lock_tickets(event_id, TicketPool::Unallocated, &[TicketStatus::Free], 1)
        .unwrap();
    store.reserve_tickets(&ids, "res-1", open, 10_000, "en").unwrap();
    store
        .assign_ticket_holder(
            ids[0],
            &TicketHolder {
                full_name: String::from("Ada Lovelace"),
                first_name: Some(String::from("Ada")),
                last_name: Some(String::from("Lovelace")),
                email: String::from("ada@example.org"),
            },
        )
        .unwrap();
    assert!(store.ticket(ids[0]).unwrap().holder.is_some());

    let released = store
        .release_reservation_tickets("res-1", TicketStatus::Free)
        .unwrap();
    assert_eq!(released, 1);

    let ticket = store.ticket(ids[0]).unwrap();
    assert_eq!(ticket.status, TicketStatus::Free);
    assert_eq!(ticket.category_id, None);
    assert_eq!(ticket.reservation_id, None);
    assert!(ticket.holder.is_none());
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Unallocated, &[TicketStatus::Free])
            .unwrap(),
        2
    );
}

#[test]
fn test_release_keeps_bounded_category() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 1);
    let mut store = persistence.store();
    store
        .insert_reservation(&create_test_reservation("res-1", event_id))
        .unwrap();
    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 1)
        .unwrap();
    store
        .reserve_tickets(&ids, "res-1", category_id, 10_000, "en")
        .unwrap();

    store.release_tickets(&ids, TicketStatus::Released).unwrap();

    let ticket = store.ticket(ids[0]).unwrap();
    assert_eq!(ticket.status, TicketStatus::Released);
    assert_eq!(ticket.category_id, Some(category_id));
}

#[test]
fn test_revert_released_tickets() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 3);
    let mut store = persistence.store();
    let ids = store
        .lock_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free], 2)
        .unwrap();
    store.set_ticket_status(&ids, TicketStatus::Released).unwrap();
    assert_eq!(
        store
            .tickets_by_status(event_id, TicketStatus::Released)
            .unwrap()
            .len(),
        2
    );

    assert_eq!(store.revert_released_tickets(event_id).unwrap(), 2);
    assert!(
        store
            .tickets_by_status(event_id, TicketStatus::Released)
            .unwrap()
            .is_empty()
    );
}
