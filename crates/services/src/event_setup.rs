// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Creating events together with their ticket inventory.

use alfio_domain::{DomainError, Event, TicketCategory};
use alfio_persistence::Persistence;
use tracing::info;

use crate::error::ServiceError;

/// Identifiers assigned to a newly created event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub event_id: i64,
    /// Category ids, in the order the categories were given.
    pub category_ids: Vec<i64>,
}

/// Inserts `event` and `categories` and generates one ticket row per seat.
///
/// Bounded categories own `max_tickets` rows each; the remaining seats form
/// the shared pool of unbounded categories.
///
/// # Errors
///
/// Returns `CapacityExceeded` when bounded categories need more seats than
/// the event has, or an error if an insert fails.
pub fn create_event(
    persistence: &mut Persistence,
    event: &Event,
    categories: &[TicketCategory],
) -> Result<CreatedEvent, ServiceError> {
    let bounded: u32 = categories
        .iter()
        .filter(|c| c.bounded)
        .map(|c| c.max_tickets)
        .sum();
    if bounded > event.available_seats {
        return Err(DomainError::CapacityExceeded {
            requested: bounded,
            available: event.available_seats,
        }
        .into());
    }

    persistence.transaction(|store| {
        let event_id = store.insert_event(event)?;
        let mut category_ids = Vec::with_capacity(categories.len());
        for category in categories {
            let category_id = store.insert_category(&TicketCategory {
                event_id,
                ..category.clone()
            })?;
            if category.bounded {
                store.insert_tickets(
                    event_id,
                    Some(category_id),
                    category.max_tickets,
                    category.src_price,
                    event.vat_status,
                    &event.currency,
                )?;
            }
            category_ids.push(category_id);
        }
        let shared = event.available_seats - bounded;
        store.insert_tickets(event_id, None, shared, 0, event.vat_status, &event.currency)?;
        info!(
            event_id,
            short_name = %event.short_name,
            seats = event.available_seats,
            bounded,
            shared,
            "Event created"
        );
        Ok(CreatedEvent {
            event_id,
            category_ids,
        })
    })
}
