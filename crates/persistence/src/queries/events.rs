// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event and ticket category queries.

use alfio_domain::{Event, TicketCategory};
use diesel::prelude::*;

use crate::data_models::{CategoryRow, EventRow};
use crate::diesel_schema::{events, ticket_categories};
use crate::error::PersistenceError;

backend_fn! {
/// Loads an event.
///
/// # Errors
///
/// Returns `NotFound` if the event does not exist.
pub fn find_event(conn: &mut _, event_id: i64) -> Result<Event, PersistenceError> {
    let row: EventRow = events::table
        .find(event_id)
        .select(EventRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("event", event_id))?;
    Event::try_from(row)
}
}

backend_fn! {
/// Loads every event with the waiting queue or pre-registration enabled.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_events_with_waiting_queue(conn: &mut _) -> Result<Vec<Event>, PersistenceError> {
    events::table
        .filter(
            events::waiting_queue_enabled
                .eq(true)
                .or(events::pre_registration_enabled.eq(true)),
        )
        .order(events::id.asc())
        .select(EventRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Event::try_from)
        .collect()
}
}

backend_fn! {
/// Loads a ticket category.
///
/// # Errors
///
/// Returns `NotFound` if the category does not exist.
pub fn find_category(conn: &mut _, category_id: i64) -> Result<TicketCategory, PersistenceError> {
    let row: CategoryRow = ticket_categories::table
        .find(category_id)
        .select(CategoryRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("ticket category", category_id))?;
    TicketCategory::try_from(row)
}
}

backend_fn! {
/// Loads the categories of an event, ordered by ordinal.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_categories(conn: &mut _, event_id: i64) -> Result<Vec<TicketCategory>, PersistenceError> {
    ticket_categories::table
        .filter(ticket_categories::event_id.eq(event_id))
        .order((ticket_categories::ordinal.asc(), ticket_categories::id.asc()))
        .select(CategoryRow::as_select())
        .load(conn)?
        .into_iter()
        .map(TicketCategory::try_from)
        .collect()
}
}
