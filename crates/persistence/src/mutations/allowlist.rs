// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Attendee group writes and acquisition bookkeeping.

use alfio_domain::{Group, GroupLink, GroupMember};
use diesel::prelude::*;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{
    allowlisted_tickets, attendee_groups, group_links, group_members, tickets,
};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a group and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_group(conn: &mut _, group: &Group) -> Result<i64, PersistenceError> {
    diesel::insert_into(attendee_groups::table)
        .values((
            attendee_groups::organization_id.eq(group.organization_id),
            attendee_groups::name.eq(&group.name),
            attendee_groups::active.eq(group.active),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Inserts a group member and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_group_member(conn: &mut _, member: &GroupMember) -> Result<i64, PersistenceError> {
    diesel::insert_into(group_members::table)
        .values((
            group_members::group_id.eq(member.group_id),
            group_members::value.eq(&member.value),
            group_members::description.eq(member.description.as_deref()),
            group_members::active.eq(member.active),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Links a group to an event and returns the link id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_group_link(conn: &mut _, link: &GroupLink) -> Result<i64, PersistenceError> {
    diesel::insert_into(group_links::table)
        .values((
            group_links::group_id.eq(link.group_id),
            group_links::event_id.eq(link.event_id),
            group_links::category_id.eq(link.category_id),
            group_links::link_type.eq(link.link_type.as_str()),
            group_links::match_type.eq(link.match_type.as_str()),
            group_links::max_allocation.eq(link.max_allocation.map(i64::from)),
            group_links::active.eq(link.active),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Records that a member acquired a ticket through a link.
///
/// # Errors
///
/// Returns an error if the insert fails or the ticket is already recorded.
pub fn insert_acquisition(
    conn: &mut _,
    group_member_id: i64,
    group_link_id: i64,
    ticket_id: i64,
) -> Result<(), PersistenceError> {
    diesel::insert_into(allowlisted_tickets::table)
        .values((
            allowlisted_tickets::group_member_id.eq(group_member_id),
            allowlisted_tickets::group_link_id.eq(group_link_id),
            allowlisted_tickets::ticket_id.eq(ticket_id),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Deletes the acquisitions of every ticket of a reservation.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_acquisitions_for_reservation(
    conn: &mut _,
    reservation_id: &str,
) -> Result<usize, PersistenceError> {
    let ticket_ids: Vec<i64> = tickets::table
        .filter(tickets::reservation_id.eq(reservation_id))
        .select(tickets::id)
        .load(conn)?;
    let deleted: usize = diesel::delete(
        allowlisted_tickets::table.filter(allowlisted_tickets::ticket_id.eq_any(&ticket_ids)),
    )
    .execute(conn)?;
    debug!(reservation_id, deleted, "Deleted group acquisitions");
    Ok(deleted)
}
}

backend_fn! {
/// Deletes the group acquisition of one ticket.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_acquisition_for_ticket(conn: &mut _, ticket_id: i64) -> Result<usize, PersistenceError> {
    Ok(diesel::delete(
        allowlisted_tickets::table.filter(allowlisted_tickets::ticket_id.eq(ticket_id)),
    )
    .execute(conn)?)
}
}
