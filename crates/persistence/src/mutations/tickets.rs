// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ticket status and price updates.

use alfio_domain::{PriceBreakdown, TicketHolder, TicketStatus, VatStatus};
use diesel::prelude::*;
use tracing::debug;

use crate::diesel_schema::{ticket_categories, tickets};
use crate::error::PersistenceError;

/// Statuses a ticket may be claimed from by a reservation.
pub const CLAIMABLE_STATUSES: &[TicketStatus] = &[
    TicketStatus::Free,
    TicketStatus::Released,
    TicketStatus::PreReserved,
];

backend_fn! {
/// Binds claimed tickets to a reservation as PENDING.
///
/// Only unbound tickets in a [`CLAIMABLE_STATUSES`] status are bound;
/// the returned count tells the caller whether every id was still free.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn reserve_tickets(
    conn: &mut _,
    ticket_ids: &[i64],
    reservation_id: &str,
    category_id: i64,
    src_price: i64,
    language: &str,
) -> Result<usize, PersistenceError> {
    let claimable: Vec<&'static str> = CLAIMABLE_STATUSES.iter().map(TicketStatus::as_str).collect();
    let updated: usize = diesel::update(tickets::table)
        .filter(tickets::id.eq_any(ticket_ids))
        .filter(tickets::status.eq_any(claimable))
        .filter(tickets::reservation_id.is_null())
        .set((
            tickets::status.eq(TicketStatus::Pending.as_str()),
            tickets::reservation_id.eq(reservation_id),
            tickets::category_id.eq(category_id),
            tickets::src_price.eq(src_price),
            tickets::user_language.eq(language),
        ))
        .execute(conn)?;
    debug!(reservation_id, category_id, updated, "Reserved tickets");
    Ok(updated)
}
}

backend_fn! {
/// Writes the computed price to every ticket of a reservation in a category.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_ticket_prices(
    conn: &mut _,
    reservation_id: &str,
    category_id: i64,
    price: &PriceBreakdown,
    vat_status: VatStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(tickets::table)
        .filter(tickets::reservation_id.eq(reservation_id))
        .filter(tickets::category_id.eq(category_id))
        .set((
            tickets::src_price.eq(price.src_price),
            tickets::final_price.eq(price.final_price),
            tickets::vat.eq(price.vat),
            tickets::discount.eq(price.discount),
            tickets::vat_status.eq(vat_status.as_str()),
        ))
        .execute(conn)?)
}
}

backend_fn! {
/// Moves every ticket of a reservation to `status`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_ticket_status_for_reservation(
    conn: &mut _,
    reservation_id: &str,
    status: TicketStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(tickets::table)
        .filter(tickets::reservation_id.eq(reservation_id))
        .set(tickets::status.eq(status.as_str()))
        .execute(conn)?)
}
}

backend_fn! {
/// Moves the given tickets to `status` without touching their binding.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_ticket_status(
    conn: &mut _,
    ticket_ids: &[i64],
    status: TicketStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(tickets::table)
        .filter(tickets::id.eq_any(ticket_ids))
        .set(tickets::status.eq(status.as_str()))
        .execute(conn)?)
}
}

backend_fn! {
/// Returns tickets to the inventory in `status`.
///
/// The reservation binding, prices and holder are cleared. Tickets of
/// unbounded categories go back to the shared pool.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn release_tickets(
    conn: &mut _,
    ticket_ids: &[i64],
    status: TicketStatus,
) -> Result<usize, PersistenceError> {
    let unbounded: Vec<i64> = ticket_categories::table
        .filter(ticket_categories::bounded.eq(false))
        .select(ticket_categories::id)
        .load(conn)?;

    diesel::update(tickets::table)
        .filter(tickets::id.eq_any(ticket_ids))
        .filter(tickets::category_id.eq_any(&unbounded))
        .set(tickets::category_id.eq(None::<i64>))
        .execute(conn)?;

    let released: usize = diesel::update(tickets::table)
        .filter(tickets::id.eq_any(ticket_ids))
        .set((
            tickets::status.eq(status.as_str()),
            tickets::reservation_id.eq(None::<String>),
            tickets::final_price.eq(0_i64),
            tickets::vat.eq(0_i64),
            tickets::discount.eq(0_i64),
            tickets::user_language.eq(None::<String>),
            tickets::full_name.eq(None::<String>),
            tickets::first_name.eq(None::<String>),
            tickets::last_name.eq(None::<String>),
            tickets::email.eq(None::<String>),
        ))
        .execute(conn)?;
    debug!(released, status = status.as_str(), "Released tickets");
    Ok(released)
}
}

backend_fn! {
/// Stores the attendee of a ticket.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn assign_ticket_holder(
    conn: &mut _,
    ticket_id: i64,
    holder: &TicketHolder,
) -> Result<(), PersistenceError> {
    diesel::update(tickets::table)
        .filter(tickets::id.eq(ticket_id))
        .set((
            tickets::full_name.eq(&holder.full_name),
            tickets::first_name.eq(holder.first_name.as_deref()),
            tickets::last_name.eq(holder.last_name.as_deref()),
            tickets::email.eq(&holder.email),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Reverts every RELEASED ticket of an event to FREE.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn revert_released_tickets(conn: &mut _, event_id: i64) -> Result<usize, PersistenceError> {
    Ok(diesel::update(tickets::table)
        .filter(tickets::event_id.eq(event_id))
        .filter(tickets::status.eq(TicketStatus::Released.as_str()))
        .set(tickets::status.eq(TicketStatus::Free.as_str()))
        .execute(conn)?)
}
}
