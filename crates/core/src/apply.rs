// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::error::CoreError;
use crate::state::{ReservationState, TransitionResult};
use alfio_audit::{Actor, AuditEvent, AuditEventType, Cause, StateSnapshot};
use alfio_domain::{PaymentProxy, ReservationStatus};

/// Applies a command to a reservation, producing the new state and an audit event.
///
/// The function is pure: callers persist `new_state` and `audit_event`
/// inside the same transaction.
///
/// # Arguments
///
/// * `state` - The current reservation state (immutable)
/// * `command` - The command to apply
/// * `actor` - The actor performing this action
/// * `cause` - The cause or reason for this action
///
/// # Returns
///
/// * `Ok(TransitionResult)` containing the new state and audit event
/// * `Err(CoreError)` if the command is invalid in the current state
///
/// # Errors
///
/// Returns `CoreError::IncompatibleState` if the reservation lifecycle does
/// not permit the command.
pub fn apply(
    state: &ReservationState,
    command: Command,
    actor: Actor,
    cause: Cause,
) -> Result<TransitionResult, CoreError> {
    let mut new_state: ReservationState = state.clone();
    let mut before: StateSnapshot = state.to_snapshot();

    let event_type: AuditEventType = match command {
        Command::Create => {
            if state.status != ReservationStatus::Pending || state.ready_for_confirmation {
                return Err(incompatible(state));
            }
            before = StateSnapshot::none();
            AuditEventType::ReservationCreate
        }
        Command::StartPayment { proxy } => {
            transition(state, &mut new_state, ReservationStatus::InPayment)?;
            new_state.payment_proxy = Some(proxy);
            AuditEventType::PaymentAttempt
        }
        Command::StartExternalPayment => {
            transition(
                state,
                &mut new_state,
                ReservationStatus::ExternalProcessingPayment,
            )?;
            AuditEventType::ExternalPaymentStarted
        }
        Command::AwaitExternalConfirmation => {
            transition(
                state,
                &mut new_state,
                ReservationStatus::WaitingExternalConfirmation,
            )?;
            AuditEventType::ExternalPaymentConfirmed
        }
        Command::RevertToPending { .. } => {
            // once an invoice number is committed the payment went through
            if state.ready_for_confirmation {
                return Err(incompatible(state));
            }
            transition(state, &mut new_state, ReservationStatus::Pending)?;
            AuditEventType::PaymentFailed
        }
        Command::MarkReadyForConfirmation { .. } => {
            if !state.status.is_finalizable() || state.ready_for_confirmation || state.finalized {
                return Err(incompatible(state));
            }
            new_state.ready_for_confirmation = true;
            AuditEventType::InvoiceNumberAssigned
        }
        Command::Finalize { proxy, deferred } => {
            if !state.ready_for_confirmation || state.finalized {
                return Err(incompatible(state));
            }
            new_state.payment_proxy = Some(proxy);
            if proxy == PaymentProxy::Offline {
                let target = if deferred {
                    ReservationStatus::DeferredOfflinePayment
                } else {
                    ReservationStatus::OfflinePayment
                };
                transition(state, &mut new_state, target)?;
                AuditEventType::ReservationOfflinePayment
            } else {
                if state.status != ReservationStatus::Complete {
                    transition(state, &mut new_state, ReservationStatus::Complete)?;
                }
                new_state.finalized = true;
                AuditEventType::ReservationComplete
            }
        }
        Command::ConfirmOfflinePayment => {
            if !matches!(
                state.status,
                ReservationStatus::OfflinePayment
                    | ReservationStatus::DeferredOfflinePayment
                    | ReservationStatus::Stuck
            ) {
                return Err(incompatible(state));
            }
            transition(state, &mut new_state, ReservationStatus::Complete)?;
            new_state.ready_for_confirmation = true;
            new_state.finalized = true;
            AuditEventType::ReservationOfflinePaymentConfirmed
        }
        Command::Cancel { expired } => {
            if !state.status.is_cancellable() {
                return Err(incompatible(state));
            }
            transition(state, &mut new_state, ReservationStatus::Cancelled)?;
            if expired {
                AuditEventType::CancelReservationExpired
            } else {
                AuditEventType::CancelReservation
            }
        }
        Command::MarkStuck => {
            if !state.status.is_payment_in_progress() {
                return Err(incompatible(state));
            }
            transition(state, &mut new_state, ReservationStatus::Stuck)?;
            AuditEventType::ReservationStuck
        }
        Command::IssueCreditNote => {
            if state.status != ReservationStatus::Complete {
                return Err(incompatible(state));
            }
            transition(state, &mut new_state, ReservationStatus::CreditNoteIssued)?;
            AuditEventType::CreditNoteIssued
        }
        Command::ReleaseTicket { last } => {
            if state.status != ReservationStatus::Complete {
                return Err(incompatible(state));
            }
            if last {
                transition(state, &mut new_state, ReservationStatus::Cancelled)?;
            }
            AuditEventType::TicketReleased
        }
    };

    let audit_event: AuditEvent = AuditEvent::new(
        state.reservation_id.clone(),
        state.event_id,
        event_type,
        actor,
        cause,
        before,
        new_state.to_snapshot(),
    );

    Ok(TransitionResult {
        new_state,
        audit_event,
    })
}

fn incompatible(state: &ReservationState) -> CoreError {
    CoreError::incompatible(&state.reservation_id, state.status)
}

fn transition(
    state: &ReservationState,
    new_state: &mut ReservationState,
    target: ReservationStatus,
) -> Result<(), CoreError> {
    state
        .status
        .validate_transition(target)
        .map_err(|_| incompatible(state))?;
    new_state.status = target;
    Ok(())
}
