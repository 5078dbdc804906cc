// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ticket inventory queries, including the allocation locks.

use alfio_domain::{Ticket, TicketCategory, TicketStatus};
use diesel::prelude::*;

use crate::data_models::TicketRow;
use crate::diesel_schema::tickets;
use crate::error::PersistenceError;

/// The rows a reservation may draw seats from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPool {
    /// Rows pre-assigned to a bounded category.
    Category(i64),
    /// The event-wide pool of rows without a category.
    Unallocated,
}

impl TicketPool {
    /// The pool `category` draws from: its own rows when bounded, the shared
    /// event pool otherwise.
    #[must_use]
    pub const fn of(category: &TicketCategory) -> Self {
        if category.bounded {
            Self::Category(category.id)
        } else {
            Self::Unallocated
        }
    }
}

pub(crate) fn status_texts(statuses: &[TicketStatus]) -> Vec<&'static str> {
    statuses.iter().map(TicketStatus::as_str).collect()
}

backend_fn! {
/// Loads the tickets of a reservation, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn find_tickets_by_reservation(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Vec<Ticket>, PersistenceError> {
    tickets::table
        .filter(tickets::reservation_id.eq(reservation_id))
        .order(tickets::id.asc())
        .select(TicketRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Ticket::try_from)
        .collect()
}
}

backend_fn! {
/// Loads a single ticket.
///
/// # Errors
///
/// Returns `NotFound` if the ticket does not exist.
pub fn find_ticket(conn: &mut _, ticket_id: i64) -> Result<Ticket, PersistenceError> {
    let row: TicketRow = tickets::table
        .find(ticket_id)
        .select(TicketRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("ticket", ticket_id))?;
    Ticket::try_from(row)
}
}

backend_fn! {
/// Loads the tickets of an event in `status`, ordered by id.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn find_tickets_by_status(
    conn: &mut _,
    event_id: i64,
    status: TicketStatus,
) -> Result<Vec<Ticket>, PersistenceError> {
    tickets::table
        .filter(tickets::event_id.eq(event_id))
        .filter(tickets::status.eq(status.as_str()))
        .order(tickets::id.asc())
        .select(TicketRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Ticket::try_from)
        .collect()
}
}

backend_fn! {
/// Counts the tickets of `pool` in one of `statuses`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tickets(
    conn: &mut _,
    event_id: i64,
    pool: TicketPool,
    statuses: &[TicketStatus],
) -> Result<u32, PersistenceError> {
    let statuses: Vec<&'static str> = status_texts(statuses);
    let base = tickets::table
        .filter(tickets::event_id.eq(event_id))
        .filter(tickets::status.eq_any(statuses));
    let count: i64 = match pool {
        TicketPool::Category(category_id) => base
            .filter(tickets::category_id.eq(category_id))
            .count()
            .get_result(conn)?,
        TicketPool::Unallocated => base
            .filter(tickets::category_id.is_null())
            .count()
            .get_result(conn)?,
    };
    crate::data_models::to_u32(count, "tickets.count")
}
}

/// Claims up to `limit` ticket ids of `pool` in one of `statuses`.
///
/// `SQLite` variant: the enclosing `BEGIN IMMEDIATE` transaction already
/// holds the write lock, so a plain select is sufficient.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_tickets_sqlite(
    conn: &mut diesel::SqliteConnection,
    event_id: i64,
    pool: TicketPool,
    statuses: &[TicketStatus],
    limit: u32,
) -> Result<Vec<i64>, PersistenceError> {
    let statuses: Vec<&'static str> = status_texts(statuses);
    let base = tickets::table
        .filter(tickets::event_id.eq(event_id))
        .filter(tickets::status.eq_any(statuses))
        .select(tickets::id)
        .order(tickets::id.asc());
    let ids: Vec<i64> = match pool {
        TicketPool::Category(category_id) => base
            .filter(tickets::category_id.eq(category_id))
            .limit(i64::from(limit))
            .load(conn)?,
        TicketPool::Unallocated => base
            .filter(tickets::category_id.is_null())
            .limit(i64::from(limit))
            .load(conn)?,
    };
    Ok(ids)
}

/// Claims up to `limit` ticket ids of `pool` in one of `statuses`.
///
/// `MySQL` variant: `FOR UPDATE SKIP LOCKED`, so concurrent reservations
/// claim disjoint rows instead of waiting on each other.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_tickets_mysql(
    conn: &mut diesel::MysqlConnection,
    event_id: i64,
    pool: TicketPool,
    statuses: &[TicketStatus],
    limit: u32,
) -> Result<Vec<i64>, PersistenceError> {
    let statuses: Vec<&'static str> = status_texts(statuses);
    let base = tickets::table
        .filter(tickets::event_id.eq(event_id))
        .filter(tickets::status.eq_any(statuses))
        .select(tickets::id)
        .order(tickets::id.asc());
    let ids: Vec<i64> = match pool {
        TicketPool::Category(category_id) => base
            .filter(tickets::category_id.eq(category_id))
            .limit(i64::from(limit))
            .for_update()
            .skip_locked()
            .load(conn)?,
        TicketPool::Unallocated => base
            .filter(tickets::category_id.is_null())
            .limit(i64::from(limit))
            .for_update()
            .skip_locked()
            .load(conn)?,
    };
    Ok(ids)
}
