// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Runs against a live `MariaDB` started by `cargo xtask test-mysql`.

use super::*;
use crate::TicketPool;
use alfio_domain::TicketStatus;

fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set")
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_migrations_and_foreign_keys() {
    let mut persistence = Persistence::new_with_mysql(&database_url()).unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
    assert!(
        persistence
            .store()
            .insert_category(&create_test_category(i64::MAX, true, 1))
            .is_err()
    );
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_lock_and_reserve() {
    let mut persistence = Persistence::new_with_mysql(&database_url()).unwrap();
    let reservation_id = uuid::Uuid::new_v4().to_string();

    persistence
        .transaction(|store| {
            let event_id = store.insert_event(&create_test_event(&reservation_id))?;
            let category_id = store.insert_category(&create_test_category(event_id, true, 2))?;
            store.insert_tickets(
                event_id,
                Some(category_id),
                2,
                10_000,
                alfio_domain::VatStatus::Included,
                "CHF",
            )?;
            store.insert_reservation(&create_test_reservation(&reservation_id, event_id))?;
            let ids = store.lock_tickets(
                event_id,
                TicketPool::Category(category_id),
                &[TicketStatus::Free],
                2,
            )?;
            assert_eq!(ids.len(), 2);
            store.reserve_tickets(&ids, &reservation_id, category_id, 10_000, "en")?;
            Ok::<_, PersistenceError>(())
        })
        .unwrap();

    let tickets = persistence
        .store()
        .tickets_by_reservation(&reservation_id)
        .unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t.status == TicketStatus::Pending));
}

#[test]
#[ignore = "requires MySQL via cargo xtask test-mysql"]
fn test_mysql_held_subscriptions_still_count_as_waiting() {
    let mut first = Persistence::new_with_mysql(&database_url()).unwrap();
    let mut second = Persistence::new_with_mysql(&database_url()).unwrap();
    let short_name = uuid::Uuid::new_v4().to_string();
    let event_id = first
        .transaction(|store| {
            let event_id = store.insert_event(&create_test_event(&short_name))?;
            store.insert_subscription(&create_test_subscription(event_id, "a@example.org", 1))?;
            Ok::<_, PersistenceError>(event_id)
        })
        .unwrap();

    first
        .transaction(|store| {
            assert_eq!(store.lock_waiting_subscriptions(event_id)?.len(), 1);
            second.transaction(|other| {
                assert!(other.lock_waiting_subscriptions(event_id)?.is_empty());
                assert_eq!(other.count_waiting_subscriptions(event_id)?, 1);
                Ok::<_, PersistenceError>(())
            })
        })
        .unwrap();
}
