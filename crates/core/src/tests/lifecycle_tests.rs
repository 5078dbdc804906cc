// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::helpers::{create_test_actor, create_test_cause, state_after};
use crate::{Command, ReservationState, apply};
use alfio_domain::{PaymentProxy, ReservationStatus};

// ============================================================================
// Card payment
// ============================================================================

#[test]
fn test_card_payment_completes_and_finalizes() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: Some(String::from("INV-001")),
        },
        Command::Finalize {
            proxy: PaymentProxy::Stripe,
            deferred: false,
        },
    ]);

    assert_eq!(state.status, ReservationStatus::Complete);
    assert!(state.ready_for_confirmation);
    assert!(state.finalized);
}

#[test]
fn test_second_finalize_is_rejected() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: None,
        },
        Command::Finalize {
            proxy: PaymentProxy::Stripe,
            deferred: false,
        },
    ]);

    let result = apply(
        &state,
        Command::Finalize {
            proxy: PaymentProxy::Stripe,
            deferred: false,
        },
        create_test_actor(),
        create_test_cause(),
    );
    assert!(result.is_err());
}

#[test]
fn test_failed_payment_returns_to_pending_and_can_retry() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        Command::RevertToPending {
            reason: String::from("card declined"),
        },
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
    ]);

    assert_eq!(state.status, ReservationStatus::InPayment);
}

// ============================================================================
// External providers
// ============================================================================

#[test]
fn test_external_confirmation_flow() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Paypal,
        },
        Command::StartExternalPayment,
        Command::AwaitExternalConfirmation,
        Command::MarkReadyForConfirmation {
            invoice_number: None,
        },
        Command::Finalize {
            proxy: PaymentProxy::Paypal,
            deferred: false,
        },
    ]);

    assert_eq!(state.status, ReservationStatus::Complete);
}

#[test]
fn test_stuck_payment_confirmed_by_admin() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        Command::MarkStuck,
        Command::ConfirmOfflinePayment,
    ]);

    assert_eq!(state.status, ReservationStatus::Complete);
    assert!(state.finalized);
}

// ============================================================================
// Offline payment
// ============================================================================

#[test]
fn test_offline_payment_is_not_finalized_until_confirmed() {
    let waiting: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Offline,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: None,
        },
        Command::Finalize {
            proxy: PaymentProxy::Offline,
            deferred: false,
        },
    ]);
    assert_eq!(waiting.status, ReservationStatus::OfflinePayment);
    assert!(!waiting.finalized);

    let confirmed = apply(
        &waiting,
        Command::ConfirmOfflinePayment,
        create_test_actor(),
        create_test_cause(),
    )
    .unwrap()
    .new_state;
    assert_eq!(confirmed.status, ReservationStatus::Complete);
    assert!(confirmed.finalized);
}

#[test]
fn test_deferred_offline_payment() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Offline,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: None,
        },
        Command::Finalize {
            proxy: PaymentProxy::Offline,
            deferred: true,
        },
    ]);
    assert_eq!(state.status, ReservationStatus::DeferredOfflinePayment);
}

#[test]
fn test_on_site_payment_completes_immediately() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::OnSite,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: None,
        },
        Command::Finalize {
            proxy: PaymentProxy::OnSite,
            deferred: false,
        },
    ]);
    assert_eq!(state.status, ReservationStatus::Complete);
}

// ============================================================================
// Credit notes
// ============================================================================

#[test]
fn test_credit_note_is_terminal() {
    let state: ReservationState = state_after(vec![
        Command::StartPayment {
            proxy: PaymentProxy::Stripe,
        },
        Command::MarkReadyForConfirmation {
            invoice_number: Some(String::from("INV-001")),
        },
        Command::Finalize {
            proxy: PaymentProxy::Stripe,
            deferred: false,
        },
        Command::IssueCreditNote,
    ]);
    assert_eq!(state.status, ReservationStatus::CreditNoteIssued);

    let result = apply(
        &state,
        Command::Cancel { expired: false },
        create_test_actor(),
        create_test_cause(),
    );
    assert!(result.is_err());
}
