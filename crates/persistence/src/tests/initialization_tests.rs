// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::*;

#[test]
fn test_in_memory_database_initializes() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_in_memory_databases_are_isolated() {
    let mut first = Persistence::new_in_memory().unwrap();
    let mut second = Persistence::new_in_memory().unwrap();

    let event_id = first.store().insert_event(&create_test_event("a")).unwrap();

    assert!(first.store().event(event_id).is_ok());
    assert!(matches!(
        second.store().event(event_id),
        Err(PersistenceError::NotFound { entity: "event", .. })
    ));
}

#[test]
fn test_file_database_initializes_and_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alfio.db");

    let event_id = {
        let mut persistence = Persistence::new_with_file(&path).unwrap();
        persistence
            .store()
            .insert_event(&create_test_event("persisted"))
            .unwrap()
    };

    let mut reopened = Persistence::new_with_file(&path).unwrap();
    let event = reopened.store().event(event_id).unwrap();
    assert_eq!(event.short_name, "persisted");
}

#[test]
fn test_foreign_keys_are_enforced() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let result = persistence
        .store()
        .insert_category(&create_test_category(999, true, 1));
    assert!(result.is_err());
}

#[test]
fn test_event_round_trip() {
    let mut persistence = Persistence::new_in_memory().unwrap();
    let mut event = create_test_event("round-trip");
    event.waiting_queue_enabled = true;
    event.id = persistence.store().insert_event(&event).unwrap();

    assert_eq!(persistence.store().event(event.id).unwrap(), event);
    assert_eq!(
        persistence.store().events_with_waiting_queue().unwrap(),
        vec![event]
    );
}
