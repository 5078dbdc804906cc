// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event, category and inventory setup.

use alfio_domain::{Event, TicketCategory, TicketStatus, VatStatus};
use diesel::prelude::*;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::{from_timestamp, join_list};
use crate::diesel_schema::{events, ticket_categories, tickets};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts an event and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &mut _, event: &Event) -> Result<i64, PersistenceError> {
    diesel::insert_into(events::table)
        .values((
            events::short_name.eq(&event.short_name),
            events::organization_id.eq(event.organization_id),
            events::format.eq(event.format.as_str()),
            events::currency.eq(&event.currency),
            events::available_seats.eq(i64::from(event.available_seats)),
            events::vat_status.eq(event.vat_status.as_str()),
            events::vat_rate.eq(i64::from(event.vat_rate.basis_points())),
            events::time_zone.eq(&event.time_zone),
            events::begin_ts.eq(from_timestamp(event.begin)),
            events::end_ts.eq(from_timestamp(event.end)),
            events::allowed_payment_proxies.eq(join_list(&event.allowed_payment_proxies)),
            events::waiting_queue_enabled.eq(event.waiting_queue_enabled),
            events::pre_registration_enabled.eq(event.pre_registration_enabled),
            events::organizer_country.eq(event.organizer_country.as_deref()),
        ))
        .execute(conn)?;

    let event_id: i64 = conn.get_last_insert_rowid()?;
    info!(event_id, short_name = %event.short_name, "Created event");
    Ok(event_id)
}
}

backend_fn! {
/// Inserts a ticket category and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_category(conn: &mut _, category: &TicketCategory) -> Result<i64, PersistenceError> {
    diesel::insert_into(ticket_categories::table)
        .values((
            ticket_categories::event_id.eq(category.event_id),
            ticket_categories::name.eq(&category.name),
            ticket_categories::bounded.eq(category.bounded),
            ticket_categories::max_tickets.eq(i64::from(category.max_tickets)),
            ticket_categories::src_price.eq(category.src_price),
            ticket_categories::access_restricted.eq(category.access_restricted),
            ticket_categories::inception.eq(from_timestamp(category.inception)),
            ticket_categories::expiration.eq(from_timestamp(category.expiration)),
            ticket_categories::ordinal.eq(category.ordinal),
            ticket_categories::access_type.eq(category.access_type.as_str()),
            ticket_categories::status.eq(category.status.as_str()),
            ticket_categories::blacklisted_payment_methods
                .eq(join_list(&category.blacklisted_payment_methods)),
        ))
        .execute(conn)?;

    let category_id: i64 = conn.get_last_insert_rowid()?;
    info!(category_id, event_id = category.event_id, "Created ticket category");
    Ok(category_id)
}
}

backend_fn! {
/// Creates `count` FREE tickets for an event.
///
/// Tickets of bounded categories carry the category and its price; the
/// shared pool is created with `category_id` = `None`.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_tickets(
    conn: &mut _,
    event_id: i64,
    category_id: Option<i64>,
    count: u32,
    src_price: i64,
    vat_status: VatStatus,
    currency: &str,
) -> Result<usize, PersistenceError> {
    if count == 0 {
        return Ok(0);
    }
    let rows: Vec<_> = (0..count)
        .map(|_| {
            (
                tickets::uuid.eq(uuid::Uuid::new_v4().to_string()),
                tickets::public_uuid.eq(uuid::Uuid::new_v4().to_string()),
                tickets::event_id.eq(event_id),
                tickets::category_id.eq(category_id),
                tickets::status.eq(TicketStatus::Free.as_str()),
                tickets::src_price.eq(src_price),
                tickets::final_price.eq(0_i64),
                tickets::vat.eq(0_i64),
                tickets::discount.eq(0_i64),
                tickets::vat_status.eq(vat_status.as_str()),
                tickets::currency.eq(currency),
            )
        })
        .collect();

    let inserted: usize = diesel::insert_into(tickets::table)
        .values(rows)
        .execute(conn)?;
    info!(event_id, ?category_id, inserted, "Created tickets");
    Ok(inserted)
}
}
