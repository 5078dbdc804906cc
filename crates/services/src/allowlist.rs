// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Group allowlist gate.

use alfio_domain::{Reservation, Ticket, find_matching_member};
use alfio_persistence::Store;
use tracing::{debug, info};

use crate::error::ServiceError;

/// Restricts categories to members of linked groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupManager;

impl GroupManager {
    /// Records a group acquisition for every ticket of `reservation`.
    ///
    /// Returns `false` as soon as one ticket's holder is not allowed; the
    /// acquisitions recorded so far stay in the transaction and the caller
    /// is expected to delete them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn acquire_group_members(
        store: &mut Store<'_>,
        reservation: &Reservation,
        tickets: &[Ticket],
    ) -> Result<bool, ServiceError> {
        store.delete_acquisitions_for_reservation(&reservation.id)?;
        for ticket in tickets {
            if !Self::acquire(store, reservation, ticket)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn acquire(
        store: &mut Store<'_>,
        reservation: &Reservation,
        ticket: &Ticket,
    ) -> Result<bool, ServiceError> {
        let Some(category_id) = ticket.category_id else {
            return Ok(true);
        };
        let links = store.active_group_links(ticket.event_id, category_id)?;
        // only the first link is honored
        let Some(link) = links.first() else {
            return Ok(true);
        };

        let email = ticket
            .holder
            .as_ref()
            .map(|holder| holder.email.as_str())
            .or(reservation.customer.email.as_deref())
            .unwrap_or_default();
        let members = store.active_group_members(link.group_id)?;
        let Some(member) = find_matching_member(&members, link.match_type, email) else {
            info!(
                reservation_id = %reservation.id,
                ticket_id = ticket.id,
                group_link_id = link.id,
                "Holder is not a group member"
            );
            return Ok(false);
        };

        if let Some(cap) = link.allocation_cap() {
            store.lock_group_link(link.id)?;
            let acquired = store.count_acquisitions(link.id, member.id)?;
            if acquired >= cap {
                info!(
                    reservation_id = %reservation.id,
                    group_member_id = member.id,
                    acquired,
                    cap,
                    "Group allocation exhausted"
                );
                return Ok(false);
            }
        }
        store.insert_acquisition(member.id, link.id, ticket.id)?;
        debug!(ticket_id = ticket.id, group_member_id = member.id, "Group acquisition recorded");
        Ok(true)
    }

    /// Deletes the acquisitions of a reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn release(store: &mut Store<'_>, reservation_id: &str) -> Result<usize, ServiceError> {
        Ok(store.delete_acquisitions_for_reservation(reservation_id)?)
    }
}
