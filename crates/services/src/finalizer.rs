// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Two-phase reservation finalization.
//!
//! Phase 1 assigns the invoice number and sets `ready_for_confirmation` in
//! its own transaction. Phase 2 acquires the tickets and marks the
//! reservation finalized in a second one. Both phases return early when
//! their marker is already set, so a retried finalization reuses the
//! invoice number of the first attempt and never acquires tickets twice.

use alfio::{Command, CoreError};
use alfio_audit::Actor;
use alfio_domain::{
    AdditionalServiceItemStatus, FINALIZE_RESERVATION_JOB, PaymentProxy, Reservation,
    ReservationStatus, SpecialPriceStatus, TicketStatus, Transaction, TransactionStatus,
    WaitingQueueStatus, offline_payment_deadline,
};
use alfio_persistence::{Persistence, PersistenceError, Store};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::billing::BillingDocumentManager;
use crate::context::ServiceContext;
use crate::error::ServiceError;
use crate::jobs::AdminJobManager;
use crate::lifecycle::{cause, transition};

/// Result of [`ReservationFinalizer::finalize_reservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Phase 2 ran in this call.
    Finalized,
    /// Nothing left to do.
    AlreadyFinalized,
    /// Phase 2 failed and a retry job has been scheduled.
    RetryScheduled,
}

/// Payload of a `finalize-reservation` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizePayload {
    pub reservation_id: String,
    pub proxy: PaymentProxy,
    pub gateway_id: Option<String>,
}

/// Confirms paid reservations.
#[derive(Clone)]
pub struct ReservationFinalizer {
    context: ServiceContext,
}

impl std::fmt::Debug for ReservationFinalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationFinalizer").finish_non_exhaustive()
    }
}

impl ReservationFinalizer {
    #[must_use]
    pub const fn new(context: ServiceContext) -> Self {
        Self { context }
    }

    /// Runs both phases for a payment settled through `proxy`.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` if phase 1 refuses the reservation, and
    /// the phase 2 error when its retry could not be scheduled.
    pub fn finalize_reservation(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        proxy: PaymentProxy,
        gateway_id: Option<&str>,
        actor: &Actor,
    ) -> Result<FinalizeOutcome, ServiceError> {
        self.prepare(persistence, reservation_id, actor)?;
        match self.complete(persistence, reservation_id, proxy, gateway_id, actor) {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(reservation_id, error = %err, "Finalization failed, scheduling retry");
                self.schedule_retry(persistence, reservation_id, proxy, gateway_id)
                    .map_err(|schedule_err| {
                        error!(reservation_id, error = %schedule_err, "Could not schedule finalization retry");
                        err
                    })?;
                Ok(FinalizeOutcome::RetryScheduled)
            }
        }
    }

    /// Phase 1: assigns the invoice number once and sets `ready_for_confirmation`.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` if the status cannot be finalized.
    pub fn prepare(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        actor: &Actor,
    ) -> Result<Reservation, ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            if reservation.ready_for_confirmation {
                debug!(reservation_id, "Already prepared for confirmation");
                return Ok(reservation);
            }
            if !reservation.status.is_finalizable() {
                return Err(CoreError::incompatible(reservation_id, reservation.status).into());
            }
            let event = store.event(reservation.event_id)?;
            if reservation.requires_invoice() && reservation.invoice_number.is_none() {
                let number = BillingDocumentManager::next_invoice_number(
                    store,
                    &event,
                    &reservation,
                    &self.context.settings.invoice_format,
                    self.context.hooks.as_ref(),
                )?;
                info!(reservation_id, invoice_number = %number, "Invoice number assigned");
                reservation.invoice_number = Some(number);
            }
            let invoice_number = reservation.invoice_number.clone();
            transition(
                store,
                &mut reservation,
                Command::MarkReadyForConfirmation { invoice_number },
                actor,
                cause("finalization phase 1"),
                now,
            )?;
            Ok(reservation)
        })
    }

    /// Phase 2: acquires tickets and confirms the reservation.
    ///
    /// Hooks and the confirmation e-mail run after commit, only when this
    /// call did the work.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` if phase 1 has not completed.
    pub fn complete(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        proxy: PaymentProxy,
        gateway_id: Option<&str>,
        actor: &Actor,
    ) -> Result<FinalizeOutcome, ServiceError> {
        let now = self.context.now();
        let settings = &self.context.settings;
        let confirmed = persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            if !reservation.ready_for_confirmation {
                return Err(CoreError::incompatible(reservation_id, reservation.status).into());
            }
            let awaiting_transfer = matches!(
                reservation.status,
                ReservationStatus::OfflinePayment | ReservationStatus::DeferredOfflinePayment
            );
            if reservation.finalized || (proxy == PaymentProxy::Offline && awaiting_transfer) {
                return Ok(None);
            }

            let event = store.event(reservation.event_id)?;
            let deferred = proxy == PaymentProxy::Offline && settings.deferred_offline_payment;
            let acquired = proxy.acquires_tickets_immediately() || deferred;
            if proxy == PaymentProxy::Offline {
                reservation.validity = offline_payment_deadline(
                    now,
                    settings.offline_payment_days,
                    &event.time_zone,
                    event.begin,
                )?;
            } else {
                reservation.confirmed_at = Some(now);
            }

            transition(
                store,
                &mut reservation,
                Command::Finalize { proxy, deferred },
                actor,
                cause("finalization phase 2"),
                now,
            )?;

            let (ticket_status, item_status) = if acquired {
                (TicketStatus::Acquired, AdditionalServiceItemStatus::Acquired)
            } else {
                (TicketStatus::ToBePaid, AdditionalServiceItemStatus::ToBePaid)
            };
            store.set_ticket_status_for_reservation(reservation_id, ticket_status)?;
            store.set_special_price_status_for_reservation(reservation_id, SpecialPriceStatus::Taken)?;
            store.set_additional_service_items_status(reservation_id, item_status)?;
            store_transaction(store, &reservation, proxy, gateway_id, now)?;
            BillingDocumentManager::ensure_billing_document_is_present(store, &event, &reservation, now)?;
            store.update_subscription_status_for_reservation(reservation_id, WaitingQueueStatus::Acquired)?;

            info!(
                reservation_id,
                status = %reservation.status,
                proxy = %proxy,
                tickets = %ticket_status,
                "Reservation finalized"
            );
            Ok::<_, ServiceError>(Some((reservation, event)))
        })?;

        let Some((reservation, event)) = confirmed else {
            return Ok(FinalizeOutcome::AlreadyFinalized);
        };
        if reservation.finalized {
            self.context.hooks.reservation_confirmed(&reservation);
        }
        if let Some(email) = reservation.customer.email.as_deref() {
            let (kind, subject) = if reservation.status == ReservationStatus::OfflinePayment {
                ("offline-payment-instructions", "Payment instructions for your reservation")
            } else {
                ("reservation-confirmed", "Your reservation is confirmed")
            };
            self.context.notify(&event, kind, Some(reservation.id.as_str()), email, subject, &|| {
                format!(
                    "Reservation {} for {} is {}. Total: {} {}",
                    reservation.id,
                    event.short_name,
                    reservation.status,
                    reservation.final_price,
                    reservation.currency
                )
            });
        }
        Ok(FinalizeOutcome::Finalized)
    }

    /// Confirms a bank transfer or an admin-approved stuck payment.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` unless the reservation awaits a transfer or is stuck.
    pub fn confirm_offline_payment(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        actor: &Actor,
    ) -> Result<(), ServiceError> {
        let now = self.context.now();
        let (reservation, event) = persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            let event = store.event(reservation.event_id)?;
            if reservation.status == ReservationStatus::Stuck
                && reservation.requires_invoice()
                && reservation.invoice_number.is_none()
            {
                reservation.invoice_number = Some(BillingDocumentManager::next_invoice_number(
                    store,
                    &event,
                    &reservation,
                    &self.context.settings.invoice_format,
                    self.context.hooks.as_ref(),
                )?);
            }
            reservation.confirmed_at = Some(now);
            transition(
                store,
                &mut reservation,
                Command::ConfirmOfflinePayment,
                actor,
                cause("offline payment confirmed"),
                now,
            )?;
            store.set_ticket_status_for_reservation(reservation_id, TicketStatus::Acquired)?;
            store.set_special_price_status_for_reservation(reservation_id, SpecialPriceStatus::Taken)?;
            store.set_additional_service_items_status(reservation_id, AdditionalServiceItemStatus::Acquired)?;
            let proxy = reservation.payment_proxy.unwrap_or(PaymentProxy::Offline);
            store_transaction(store, &reservation, proxy, None, now)?;
            BillingDocumentManager::ensure_billing_document_is_present(store, &event, &reservation, now)?;
            store.update_subscription_status_for_reservation(reservation_id, WaitingQueueStatus::Acquired)?;
            Ok::<_, ServiceError>((reservation, event))
        })?;

        info!(reservation_id, "Offline payment confirmed");
        self.context.hooks.reservation_confirmed(&reservation);
        if let Some(email) = reservation.customer.email.as_deref() {
            self.context.notify(
                &event,
                "reservation-confirmed",
                Some(reservation.id.as_str()),
                email,
                "Your payment has been received",
                &|| format!("Reservation {} for {} is complete", reservation.id, event.short_name),
            );
        }
        Ok(())
    }

    fn schedule_retry(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        proxy: PaymentProxy,
        gateway_id: Option<&str>,
    ) -> Result<i64, ServiceError> {
        let payload = FinalizePayload {
            reservation_id: reservation_id.to_string(),
            proxy,
            gateway_id: gateway_id.map(ToString::to_string),
        };
        let payload = serde_json::to_value(&payload)
            .map_err(PersistenceError::from)?;
        let execute_at = self.context.now() + self.context.settings.finalize_retry_delay;
        persistence.transaction(|store| {
            AdminJobManager::schedule(store, FINALIZE_RESERVATION_JOB, payload, execute_at)
        })
    }
}

/// Creates or completes the payment row of a finalized reservation.
///
/// Free and admin reservations carry no payment row.
fn store_transaction(
    store: &mut Store<'_>,
    reservation: &Reservation,
    proxy: PaymentProxy,
    gateway_id: Option<&str>,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    let status = match proxy {
        PaymentProxy::None | PaymentProxy::Admin => return Ok(()),
        PaymentProxy::Offline if !reservation.finalized => TransactionStatus::OfflinePendingReview,
        PaymentProxy::OnSite => TransactionStatus::Pending,
        _ => TransactionStatus::Complete,
    };
    if let Some(mut existing) = store.transaction(&reservation.id)? {
        if let Some(gateway_id) = gateway_id {
            existing.gateway_transaction_id = gateway_id.to_string();
        }
        existing.status = status;
        existing.amount = reservation.final_price;
        store.update_transaction(&existing)?;
        return Ok(());
    }
    let transaction = Transaction {
        id: 0,
        reservation_id: reservation.id.clone(),
        gateway_transaction_id: gateway_id.unwrap_or(&reservation.id).to_string(),
        gateway_payment_id: None,
        amount: reservation.final_price,
        currency: reservation.currency.clone(),
        description: format!("Reservation {}", reservation.id),
        payment_proxy: proxy,
        platform_fee: 0,
        gateway_fee: 0,
        status,
        created_at: now,
        metadata: serde_json::json!({}),
    };
    store.insert_transaction(&transaction)?;
    Ok(())
}
