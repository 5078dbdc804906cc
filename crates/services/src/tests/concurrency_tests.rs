// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::{DistributionSummary, ServiceError, SubscriptionRequest, TicketLine, create_event};
use alfio::CoreError;
use alfio_domain::{ReservationStatus, TicketStatus};
use alfio_persistence::{Persistence, TicketPool};
use std::sync::{Arc, Barrier};
use std::thread;

const BUYERS: usize = 4;

#[test]
fn test_concurrent_buyers_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sale.db");
    let h = Harness::new();

    let mut seeder = Persistence::new_with_file(&path).unwrap();
    let created = create_event(
        &mut seeder,
        &test_event(3),
        &[category("Standard", true, 3, 10_000)],
    )
    .unwrap();
    let (event_id, category_id) = (created.event_id, created.category_ids[0]);

    let barrier = Arc::new(Barrier::new(BUYERS));
    let manager = &h.manager;
    let outcomes: Vec<Result<String, ServiceError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..BUYERS)
            .map(|_| {
                let mut persistence = Persistence::new_with_file(&path).unwrap();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    manager.create_ticket_reservation(
                        &mut persistence,
                        &request(event_id, vec![TicketLine::new(category_id, 2)]),
                        &customer(),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    let winners: Vec<&String> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|err| *err == ServiceError::Core(CoreError::NotEnoughTickets))
    );

    let mut store = seeder.store();
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Pending])
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .count_tickets(event_id, TicketPool::Category(category_id), &[TicketStatus::Free])
            .unwrap(),
        1
    );
    let reservation = store.reservation(winners[0]).unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    // losers left no draft behind
    assert_eq!(
        store
            .reservations_by_status(event_id, &[ReservationStatus::Pending])
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_concurrent_payments_confirm_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pay.db");
    let h = Harness::new();

    let mut seeder = Persistence::new_with_file(&path).unwrap();
    let created = create_event(
        &mut seeder,
        &test_event(2),
        &[category("Standard", true, 2, 10_000)],
    )
    .unwrap();
    let reservation_id = h
        .manager
        .create_ticket_reservation(
            &mut seeder,
            &request(created.event_id, vec![TicketLine::new(created.category_ids[0], 1)]),
            &customer(),
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let manager = &h.manager;
    let results: Vec<alfio::PaymentResult> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut persistence = Persistence::new_with_file(&path).unwrap();
                let barrier = Arc::clone(&barrier);
                let reservation_id = reservation_id.clone();
                scope.spawn(move || {
                    barrier.wait();
                    manager
                        .perform_payment(&mut persistence, &reservation_id, &card(), &customer())
                        .unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_successful()).count(), 1);
    assert_eq!(
        seeder.store().reservation(&reservation_id).unwrap().status,
        ReservationStatus::Complete
    );
    assert_eq!(h.hooks.confirmed.lock().unwrap().len(), 1);
}

#[test]
fn test_concurrent_distributions_offer_each_seat_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.db");
    let h = Harness::new();

    let mut seeder = Persistence::new_with_file(&path).unwrap();
    let mut event = test_event(2);
    event.waiting_queue_enabled = true;
    let created = create_event(&mut seeder, &event, &[category("Standard", true, 2, 10_000)]).unwrap();
    let (event_id, category_id) = (created.event_id, created.category_ids[0]);
    let holder = h
        .manager
        .create_ticket_reservation(
            &mut seeder,
            &request(event_id, vec![TicketLine::new(category_id, 2)]),
            &customer(),
        )
        .unwrap();
    h.manager
        .waiting_queue()
        .subscribe(
            &mut seeder,
            &SubscriptionRequest {
                event_id,
                full_name: String::from("Grace Hopper"),
                email: String::from("grace@example.org"),
                language: String::from("en"),
                selected_category_id: None,
            },
        )
        .unwrap();
    h.manager
        .cancel_reservation(&mut seeder, &holder, false, &admin())
        .unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let queue = h.manager.waiting_queue();
    let summaries: Vec<DistributionSummary> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let mut persistence = Persistence::new_with_file(&path).unwrap();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    queue.distribute_seats(&mut persistence, event_id).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(summaries.iter().map(|s| s.offered).sum::<usize>(), 1);
    assert_eq!(summaries.iter().map(|s| s.reverted).sum::<usize>(), 1);
    let mut store = seeder.store();
    let pool = TicketPool::Category(category_id);
    assert_eq!(store.count_tickets(event_id, pool, &[TicketStatus::Pending]).unwrap(), 1);
    assert_eq!(store.count_tickets(event_id, pool, &[TicketStatus::Free]).unwrap(), 1);
    assert_eq!(store.count_tickets(event_id, pool, &[TicketStatus::Released]).unwrap(), 0);
}
