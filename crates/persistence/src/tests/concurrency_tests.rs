// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;
use crate::TicketPool;
use alfio_domain::TicketStatus;
use std::sync::{Arc, Barrier};
use std::thread;

fn claim_all(
    persistence: &mut Persistence,
    reservation_id: &str,
    event_id: i64,
    category_id: i64,
    quantity: u32,
) -> Result<(), PersistenceError> {
    persistence.transaction(|store| {
        store.insert_reservation(&create_test_reservation(reservation_id, event_id))?;
        let ids = store.lock_tickets(
            event_id,
            TicketPool::Category(category_id),
            &[TicketStatus::Free],
            quantity,
        )?;
        if ids.len() < quantity as usize {
            return Err(PersistenceError::QueryFailed(String::from("sold out")));
        }
        store.reserve_tickets(&ids, reservation_id, category_id, 10_000, "en")?;
        Ok(())
    })
}

#[test]
fn test_concurrent_claims_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let mut seeder = Persistence::new_with_file(&path).unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut seeder, 2);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["res-a", "res-b"]
        .into_iter()
        .map(|reservation_id| {
            let mut persistence = Persistence::new_with_file(&path).unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                claim_all(&mut persistence, reservation_id, event_id, category_id, 2).is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(successes, 1);

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
        0
    );
}

#[test]
fn test_sequential_claims_respect_remaining_inventory() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let (event_id, category_id) = seed_bounded_event(&mut persistence, 3);

    assert!(claim_all(&mut persistence, "first", event_id, category_id, 2).is_ok());
    assert!(claim_all(&mut persistence, "second", event_id, category_id, 2).is_err());
    assert!(claim_all(&mut persistence, "third", event_id, category_id, 1).is_ok());
    assert!(persistence.store().reservation("second").is_err());
}
