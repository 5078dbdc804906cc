// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{
    create_test_actor, create_test_cause, create_test_state, state_with_status,
};
use crate::{Command, CoreError, ReservationState, TransitionResult, apply};
use alfio_audit::AuditEventType;
use alfio_domain::{PaymentProxy, ReservationStatus};

#[test]
fn test_create_emits_audit_event_without_before_state() {
    let state: ReservationState = create_test_state();

    let transition: TransitionResult =
        apply(&state, Command::Create, create_test_actor(), create_test_cause()).unwrap();

    assert_eq!(
        transition.audit_event.event_type,
        AuditEventType::ReservationCreate
    );
    assert_eq!(transition.audit_event.before.status, None);
    assert_eq!(
        transition.audit_event.after.status,
        Some(ReservationStatus::Pending)
    );
    assert_eq!(transition.audit_event.reservation_id, "res-1");
    assert_eq!(transition.audit_event.actor.id, "buyer@example.org");
    assert_eq!(transition.audit_event.cause.id, "req-456");
}

#[test]
fn test_start_payment_records_proxy() {
    let state: ReservationState = create_test_state();

    let transition: TransitionResult = apply(
        &state,
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(transition.new_state.status, ReservationStatus::InPayment);
    assert_eq!(transition.new_state.payment_proxy, Some(PaymentProxy::Stripe));
    assert_eq!(
        transition.audit_event.before.status,
        Some(ReservationStatus::Pending)
    );
    assert_eq!(
        transition.audit_event.after.status,
        Some(ReservationStatus::InPayment)
    );
}

#[test]
fn test_failed_command_does_not_mutate_state() {
    let state: ReservationState = state_with_status(ReservationStatus::Cancelled);
    let original: ReservationState = state.clone();

    let result: Result<TransitionResult, CoreError> = apply(
        &state,
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        create_test_actor(),
        create_test_cause(),
    );

    assert!(matches!(
        result,
        Err(CoreError::IncompatibleState {
            status: ReservationStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(state, original);
}

#[test]
fn test_finalize_requires_ready_for_confirmation() {
    let state: ReservationState = state_with_status(ReservationStatus::InPayment);

    let result = apply(
        &state,
        Command::Finalize {
            proxy: PaymentProxy::Stripe,
            deferred: false,
        },
        create_test_actor(),
        create_test_cause(),
    );

    assert!(matches!(result, Err(CoreError::IncompatibleState { .. })));
}

#[test]
fn test_mark_ready_twice_is_rejected() {
    let mut state: ReservationState = state_with_status(ReservationStatus::InPayment);
    state.ready_for_confirmation = true;

    let result = apply(
        &state,
        Command::MarkReadyForConfirmation {
            invoice_number: Some(String::from("INV-001")),
        },
        create_test_actor(),
        create_test_cause(),
    );

    assert!(matches!(result, Err(CoreError::IncompatibleState { .. })));
}

#[test]
fn test_revert_after_phase_one_is_rejected() {
    let mut state: ReservationState = state_with_status(ReservationStatus::InPayment);
    state.ready_for_confirmation = true;

    let result = apply(
        &state,
        Command::RevertToPending {
            reason: String::from("timeout"),
        },
        create_test_actor(),
        create_test_cause(),
    );

    assert!(result.is_err());
}

#[test]
fn test_cancel_expired_uses_expiry_event_type() {
    let state: ReservationState = create_test_state();

    let transition: TransitionResult = apply(
        &state,
        Command::Cancel { expired: true },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();

    assert_eq!(transition.new_state.status, ReservationStatus::Cancelled);
    assert_eq!(
        transition.audit_event.event_type,
        AuditEventType::CancelReservationExpired
    );
}

#[test]
fn test_mark_stuck_only_during_payment() {
    let pending = create_test_state();
    assert!(
        apply(
            &pending,
            Command::MarkStuck,
            create_test_actor(),
            create_test_cause()
        )
        .is_err()
    );

    let external = state_with_status(ReservationStatus::ExternalProcessingPayment);
    let transition = apply(
        &external,
        Command::MarkStuck,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(transition.new_state.status, ReservationStatus::Stuck);
}

#[test]
fn test_release_last_ticket_cancels_reservation() {
    let complete = state_with_status(ReservationStatus::Complete);

    let not_last = apply(
        &complete,
        Command::ReleaseTicket { last: false },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(not_last.new_state.status, ReservationStatus::Complete);

    let last = apply(
        &complete,
        Command::ReleaseTicket { last: true },
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(last.new_state.status, ReservationStatus::Cancelled);
    assert_eq!(last.audit_event.event_type, AuditEventType::TicketReleased);
}
