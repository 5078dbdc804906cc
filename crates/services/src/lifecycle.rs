// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persisting state machine transitions and releasing held resources.

use alfio::{Command, ReservationState, TransitionResult, apply};
use alfio_audit::{Actor, Cause};
use alfio_domain::{
    AdditionalServiceItemStatus, Event, Reservation, TicketStatus, WaitingQueueStatus,
};
use alfio_persistence::Store;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ServiceError;

/// Builds a cause with a fresh correlation id.
pub(crate) fn cause(description: &str) -> Cause {
    Cause::new(uuid::Uuid::new_v4().to_string(), description.to_string())
}

/// Applies `command`, writes the new state and its audit event.
///
/// Fields outside the state machine (invoice number, validity, totals) are
/// written from `reservation` as they are.
///
/// # Errors
///
/// Returns `IncompatibleState` if the lifecycle refuses the command.
pub(crate) fn transition(
    store: &mut Store<'_>,
    reservation: &mut Reservation,
    command: Command,
    actor: &Actor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<TransitionResult, ServiceError> {
    let state = ReservationState::from(&*reservation);
    let command_name = command.name();
    let result = apply(&state, command, actor.clone(), cause)?;

    reservation.status = result.new_state.status;
    reservation.payment_proxy = result.new_state.payment_proxy;
    reservation.ready_for_confirmation = result.new_state.ready_for_confirmation;
    reservation.finalized = result.new_state.finalized;
    store.update_reservation(reservation)?;
    store.record_transition(&result, now)?;

    debug!(
        reservation_id = %reservation.id,
        command = command_name,
        from = %state.status,
        to = %reservation.status,
        "Reservation transitioned"
    );
    Ok(result)
}

/// Status released tickets of `event` go back to.
pub(crate) const fn released_ticket_status(event: &Event) -> TicketStatus {
    if event.waiting_queue_enabled {
        TicketStatus::Released
    } else {
        TicketStatus::Free
    }
}

/// Gives back everything a reservation holds.
///
/// Tickets return to the pool, tokens become FREE again, group acquisitions
/// and pending payment rows are deleted, supplements are cancelled and a
/// waiting-queue subscription moves to `subscription_status`.
pub(crate) fn release_reservation_resources(
    store: &mut Store<'_>,
    reservation: &Reservation,
    event: &Event,
    subscription_status: WaitingQueueStatus,
) -> Result<usize, ServiceError> {
    // acquisitions are found through the reservation's tickets
    store.delete_acquisitions_for_reservation(&reservation.id)?;
    let released =
        store.release_reservation_tickets(&reservation.id, released_ticket_status(event))?;
    store.reset_special_prices_for_reservation(&reservation.id)?;
    store.set_additional_service_items_status(
        &reservation.id,
        AdditionalServiceItemStatus::Cancelled,
    )?;
    if store
        .transaction(&reservation.id)?
        .is_some_and(|transaction| !transaction.is_complete())
    {
        store.delete_transaction(&reservation.id)?;
    }
    store.update_subscription_status_for_reservation(&reservation.id, subscription_status)?;
    debug!(
        reservation_id = %reservation.id,
        event_id = event.id,
        released,
        "Reservation resources released"
    );
    Ok(released)
}
