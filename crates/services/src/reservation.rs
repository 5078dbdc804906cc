// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reservation lifecycle operations.
//!
//! Every public operation runs in one or more explicit transactions. Row
//! locks taken inside a transaction are the only concurrency mechanism;
//! nothing is shared between managers except the injected collaborators.

use std::collections::BTreeMap;

use alfio::{
    Capability, Command, CoreError, PaymentContext, PaymentProvider, PaymentResult,
    PaymentSpecification, ReservationState, TransactionInit, WebhookStatus, apply,
};
use alfio_audit::{Actor, ActorKind};
use alfio_domain::{
    AdditionalServiceItem, AdditionalServiceItemStatus, BillingDocument, Discount, Event,
    FINALIZE_RESERVATION_JOB, PaymentProxy, PromoCodeDiscount, Reservation, ReservationStatus,
    TicketCategory, TicketStatus, TotalPrice, Transaction, TransactionStatus, WaitingQueueStatus,
    calculate_price, category_vat_status, evaluate_reverse_charge, reservation_vat_status,
};
use alfio_persistence::{Persistence, PersistenceError, Store};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::allocator::{
    Allocation, category_on_sale, draft_reservation, price_category, refresh_totals,
    reserve_tickets_for_category,
};
use crate::allowlist::GroupManager;
use crate::billing::BillingDocumentManager;
use crate::context::ServiceContext;
use crate::error::ServiceError;
use crate::finalizer::{FinalizeOutcome, FinalizePayload, ReservationFinalizer};
use crate::jobs::{AdminJobManager, JobRunSummary};
use crate::lifecycle::{cause, release_reservation_resources, released_ticket_status, transition};
use crate::payment::{PaymentManager, codes};
use crate::promo_code::PromoCodeManager;
use crate::request::{CustomerUpdate, PaymentRequest, ReservationRequest};
use crate::waiting_queue::WaitingQueueManager;

/// Statuses swept by [`TicketReservationManager::cleanup_expired_reservations`].
const EXPIRABLE_STATUSES: &[ReservationStatus] =
    &[ReservationStatus::Pending, ReservationStatus::OfflinePayment];

/// Statuses swept by [`TicketReservationManager::mark_stuck_reservations`].
const IN_PAYMENT_STATUSES: &[ReservationStatus] = &[
    ReservationStatus::InPayment,
    ReservationStatus::ExternalProcessingPayment,
    ReservationStatus::WaitingExternalConfirmation,
];

/// Statuses awaiting a bank transfer.
const OFFLINE_STATUSES: &[ReservationStatus] = &[
    ReservationStatus::OfflinePayment,
    ReservationStatus::DeferredOfflinePayment,
];

/// State of a reservation once it entered payment.
struct PaymentAttempt {
    reservation: Reservation,
    proxy: PaymentProxy,
}

/// Entry point for everything a buyer or an organizer does with a reservation.
pub struct TicketReservationManager {
    context: ServiceContext,
    payments: PaymentManager,
    finalizer: ReservationFinalizer,
    waiting_queue: WaitingQueueManager,
}

impl std::fmt::Debug for TicketReservationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketReservationManager")
            .field("payments", &self.payments)
            .finish_non_exhaustive()
    }
}

impl TicketReservationManager {
    /// Creates a manager with the built-in payment providers.
    #[must_use]
    pub fn new(context: ServiceContext) -> Self {
        let payments = PaymentManager::new(&context.settings);
        Self::with_payments(context, payments)
    }

    /// Creates a manager using `payments`.
    #[must_use]
    pub fn with_payments(context: ServiceContext, payments: PaymentManager) -> Self {
        Self {
            finalizer: ReservationFinalizer::new(context.clone()),
            waiting_queue: WaitingQueueManager::new(context.clone()),
            context,
            payments,
        }
    }

    #[must_use]
    pub const fn context(&self) -> &ServiceContext {
        &self.context
    }

    #[must_use]
    pub const fn payments(&self) -> &PaymentManager {
        &self.payments
    }

    pub const fn payments_mut(&mut self) -> &mut PaymentManager {
        &mut self.payments
    }

    #[must_use]
    pub const fn finalizer(&self) -> &ReservationFinalizer {
        &self.finalizer
    }

    #[must_use]
    pub const fn waiting_queue(&self) -> &WaitingQueueManager {
        &self.waiting_queue
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Holds seats for `request` and returns the new reservation id.
    ///
    /// Everything happens in one transaction: a failing line, an exceeded
    /// promo code or a category mix without payment method leaves nothing
    /// behind.
    ///
    /// # Errors
    ///
    /// * `NotEnoughTickets` - a line cannot be served
    /// * `MissingSpecialPriceToken` / `InvalidSpecialPriceToken` - token problems
    /// * `InvalidPromoCode` - unknown or inactive code
    /// * `TooManyTicketsForDiscountCode` - the code is used up
    /// * `CannotProceedWithPayment` - no method is left for the categories
    pub fn create_ticket_reservation(
        &self,
        persistence: &mut Persistence,
        request: &ReservationRequest,
        actor: &Actor,
    ) -> Result<String, ServiceError> {
        request.validate()?;
        let now = self.context.now();
        let reservation_id = uuid::Uuid::new_v4().to_string();
        let validity = now + self.context.settings.reservation_timeout;

        persistence.transaction(|store| {
            let event = store.event(request.event_id)?;
            let promo = self.resolve_discount(store, &event, request, now)?;

            let mut reservation =
                draft_reservation(&event, &reservation_id, now, validity, &request.language);
            reservation.promo_code_id = promo.as_ref().map(|p| p.id);
            store.insert_reservation(&reservation)?;

            let allocation = Allocation {
                event: &event,
                reservation_id: &reservation_id,
                language: &request.language,
                now,
            };
            let mut categories: Vec<TicketCategory> = Vec::with_capacity(request.lines.len());
            for line in &request.lines {
                let category = category_on_sale(store, &event, line.category_id, now)?;
                reserve_tickets_for_category(
                    store,
                    &allocation,
                    &category,
                    line,
                    promo.as_ref(),
                    &[TicketStatus::Free],
                )?;
                categories.push(category);
            }
            Self::add_additional_services(store, &event, &reservation_id, request)?;

            let discount = promo.as_ref().and_then(PromoCodeDiscount::discount);
            let total = refresh_totals(store, &mut reservation, discount.as_ref())?;
            if let Some(promo) = &promo {
                let tickets = store.tickets_by_reservation(&reservation_id)?;
                let requested = PromoCodeManager::discounted_tickets(promo, &tickets);
                PromoCodeManager::check_usage(store, promo, &reservation, requested)?;
            }
            if total.requires_payment() && !self.payments.can_proceed(store, event.id, &categories)? {
                return Err(CoreError::CannotProceedWithPayment.into());
            }
            store.update_reservation(&reservation)?;

            let created = apply(
                &ReservationState::pending(reservation_id.clone(), event.id),
                Command::Create,
                actor.clone(),
                cause("reservation requested"),
            )?;
            store.record_transition(&created, now)?;
            info!(
                reservation_id = %reservation_id,
                event_id = event.id,
                tickets = request.ticket_count(),
                total = total.price_with_vat,
                "Reservation created"
            );
            Ok(reservation_id.clone())
        })
    }

    /// The promo code typed by the buyer, or a discount offered by an extension.
    fn resolve_discount(
        &self,
        store: &mut Store<'_>,
        event: &Event,
        request: &ReservationRequest,
        now: OffsetDateTime,
    ) -> Result<Option<PromoCodeDiscount>, ServiceError> {
        if let Some(code) = request.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
            return PromoCodeManager::resolve(store, event, code, now).map(Some);
        }
        let quantities: Vec<(i64, u32)> = request
            .lines
            .iter()
            .map(|line| (line.category_id, line.quantity))
            .collect();
        match self.context.hooks.dynamic_discount(event.id, &quantities) {
            Some(dynamic) => PromoCodeManager::persist_dynamic(store, event, &dynamic, now).map(Some),
            None => Ok(None),
        }
    }

    /// Adds mandatory supplements, one per ticket, and the requested optional ones.
    fn add_additional_services(
        store: &mut Store<'_>,
        event: &Event,
        reservation_id: &str,
        request: &ReservationRequest,
    ) -> Result<(), ServiceError> {
        let services = store.additional_services(event.id)?;
        let tickets = request.ticket_count();
        let mut wanted: Vec<(usize, u32)> = services
            .iter()
            .enumerate()
            .map(|(index, service)| (index, service.mandatory_quantity(tickets)))
            .filter(|(_, quantity)| *quantity > 0)
            .collect();
        for line in &request.additional_services {
            let index = services
                .iter()
                .position(|s| s.id == line.service_id)
                .ok_or_else(|| CoreError::not_found("additional service", line.service_id))?;
            services[index].validate_requested(line.quantity, tickets)?;
            wanted.push((index, line.quantity));
        }

        for (index, quantity) in wanted {
            let service = &services[index];
            // supplements are never discounted
            let price = calculate_price(service.price, service.vat_status, event.vat_rate, None)?;
            for _ in 0..quantity {
                store.insert_additional_service_item(&AdditionalServiceItem {
                    id: 0,
                    uuid: uuid::Uuid::new_v4().to_string(),
                    reservation_id: reservation_id.to_string(),
                    additional_service_id: service.id,
                    status: AdditionalServiceItemStatus::Pending,
                    src_price: price.src_price,
                    final_price: price.final_price,
                    vat: price.vat,
                    discount: price.discount,
                })?;
            }
            debug!(reservation_id, service_id = service.id, quantity, "Additional service added");
        }
        Ok(())
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    /// Stores contact, billing and attendee data of a PENDING reservation.
    ///
    /// Ticket prices are recomputed when the billing data changes the
    /// reverse-charge outcome.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` unless the reservation is PENDING, and
    /// `NotFound` for a ticket outside the reservation.
    pub fn update_customer_details(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        update: &CustomerUpdate,
    ) -> Result<Reservation, ServiceError> {
        let settings = &self.context.settings;
        let (reservation, assigned) = persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            if reservation.status != ReservationStatus::Pending {
                return Err(CoreError::incompatible(reservation_id, reservation.status).into());
            }
            let event = store.event(reservation.event_id)?;
            reservation.customer = update.customer.clone();
            reservation.billing = update.billing.clone();

            let outcome = evaluate_reverse_charge(&event, &reservation.billing, settings.reverse_charge);
            reservation.vat_status = reservation_vat_status(&event, outcome);
            let promo = Self::reservation_promo(store, &reservation)?;
            let tickets = store.tickets_by_reservation(reservation_id)?;
            let mut category_ids: Vec<i64> = tickets.iter().filter_map(|t| t.category_id).collect();
            category_ids.sort_unstable();
            category_ids.dedup();
            for category_id in category_ids {
                let category = store.category(category_id)?;
                let discount = promo
                    .as_ref()
                    .filter(|p| p.applies_to_category(category_id))
                    .and_then(PromoCodeDiscount::discount);
                let vat_status = category_vat_status(&event, &category, outcome);
                price_category(store, &event, reservation_id, &category, discount.as_ref(), vat_status)?;
            }

            let mut assigned = Vec::with_capacity(update.attendees.len());
            for attendee in &update.attendees {
                if !tickets.iter().any(|t| t.id == attendee.ticket_id) {
                    return Err(CoreError::not_found("ticket", attendee.ticket_id).into());
                }
                store.assign_ticket_holder(attendee.ticket_id, &attendee.holder)?;
                assigned.push(attendee.ticket_id);
            }

            let discount = promo.as_ref().and_then(PromoCodeDiscount::discount);
            refresh_totals(store, &mut reservation, discount.as_ref())?;
            store.update_reservation(&reservation)?;
            debug!(
                reservation_id,
                vat_status = %reservation.vat_status,
                attendees = assigned.len(),
                "Customer details updated"
            );
            Ok::<_, ServiceError>((reservation, assigned))
        })?;

        let mut store = persistence.store();
        for ticket_id in assigned {
            let ticket = store.ticket(ticket_id)?;
            self.context.hooks.ticket_assigned(&ticket);
        }
        Ok(reservation)
    }

    /// Pays a reservation through `request.proxy`.
    ///
    /// Business refusals come back as a failed [`PaymentResult`] carrying an
    /// `error.STEP2_*` code. Only a missing reservation is an `Err`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reservation does not exist.
    pub fn perform_payment(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        request: &PaymentRequest,
        actor: &Actor,
    ) -> Result<PaymentResult, ServiceError> {
        let attempt = match self.enter_payment(persistence, reservation_id, request, actor)? {
            Ok(attempt) => attempt,
            Err(rejection) => return Ok(rejection),
        };
        match self.pay(persistence, &attempt, request, actor) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!(reservation_id, error = %err, "Unexpected payment error");
                if let Err(revert_err) = self.revert_unless_in_payment(persistence, reservation_id, actor) {
                    warn!(reservation_id, error = %revert_err, "Could not revert reservation");
                }
                Ok(PaymentResult::failed(codes::PAYMENT_UNEXPECTED))
            }
        }
    }

    /// Checks the allowlist and the method, then moves the reservation to IN_PAYMENT.
    fn enter_payment(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        request: &PaymentRequest,
        actor: &Actor,
    ) -> Result<Result<PaymentAttempt, PaymentResult>, ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            // acquisitions of a paid reservation must survive a second attempt
            if reservation.status != ReservationStatus::Pending {
                info!(reservation_id, status = %reservation.status, "Reservation cannot enter payment");
                return Ok(Err(PaymentResult::failed(codes::UNABLE_TO_TRANSITION)));
            }
            let proxy = if reservation.final_price == 0 {
                PaymentProxy::None
            } else {
                request.proxy
            };
            let tickets = store.tickets_by_reservation(reservation_id)?;

            if !GroupManager::acquire_group_members(store, &reservation, &tickets)? {
                GroupManager::release(store, reservation_id)?;
                return Ok(Err(PaymentResult::failed(codes::WHITELIST)));
            }
            if proxy != PaymentProxy::None {
                for category_id in tickets.iter().filter_map(|t| t.category_id) {
                    if store.category(category_id)?.blacklists(request.method) {
                        GroupManager::release(store, reservation_id)?;
                        return Ok(Err(PaymentResult::failed(codes::PAYMENT_METHOD_BLACKLISTED)));
                    }
                }
            }
            if let Err(err) = transition(
                store,
                &mut reservation,
                Command::StartPayment { proxy },
                actor,
                cause("payment requested"),
                now,
            ) {
                info!(reservation_id, error = %err, "Reservation cannot enter payment");
                GroupManager::release(store, reservation_id)?;
                return Ok(Err(PaymentResult::failed(codes::UNABLE_TO_TRANSITION)));
            }

            if let Some(promo_code_id) = reservation.promo_code_id {
                let promo = store.lock_promo_code(promo_code_id)?;
                let requested = PromoCodeManager::discounted_tickets(&promo, &tickets);
                if let Err(err) = PromoCodeManager::check_usage(store, &promo, &reservation, requested) {
                    info!(reservation_id, error = %err, "Promo code used up during checkout");
                    transition(
                        store,
                        &mut reservation,
                        Command::RevertToPending {
                            reason: codes::DISCOUNT_CODE_USAGE_EXCEEDED.to_string(),
                        },
                        actor,
                        cause("promo code usage exceeded"),
                        now,
                    )?;
                    GroupManager::release(store, reservation_id)?;
                    return Ok(Err(PaymentResult::failed(codes::DISCOUNT_CODE_USAGE_EXCEEDED)));
                }
            }
            Ok(Ok(PaymentAttempt { reservation, proxy }))
        })
    }

    /// Delegates to the provider and reacts to its answer.
    fn pay(
        &self,
        persistence: &mut Persistence,
        attempt: &PaymentAttempt,
        request: &PaymentRequest,
        actor: &Actor,
    ) -> Result<PaymentResult, ServiceError> {
        let reservation = &attempt.reservation;
        if attempt.proxy == PaymentProxy::None {
            self.finalizer
                .finalize_reservation(persistence, &reservation.id, PaymentProxy::None, None, actor)?;
            return Ok(PaymentResult::Successful {
                gateway_id: reservation.id.clone(),
            });
        }

        let context = PaymentContext {
            event_id: reservation.event_id,
            proxy: attempt.proxy,
            method: request.method,
            amount: reservation.final_price,
            currency: reservation.currency.clone(),
        };
        let Some(provider) = self.payments.lookup_provider(&context) else {
            warn!(
                reservation_id = %reservation.id,
                proxy = %attempt.proxy,
                method = %request.method,
                "No payment provider"
            );
            self.revert_to_pending(persistence, &reservation.id, codes::PROVIDER_NOT_FOUND, actor)?;
            return Ok(PaymentResult::failed(codes::PROVIDER_NOT_FOUND));
        };

        let spec = payment_specification(reservation, request);
        let result = provider.get_token_and_pay(&spec);
        debug!(reservation_id = %reservation.id, provider = %provider.id, ?result, "Provider answered");
        match &result {
            PaymentResult::Successful { gateway_id } => {
                self.finalizer.finalize_reservation(
                    persistence,
                    &reservation.id,
                    attempt.proxy,
                    Some(gateway_id.as_str()),
                    actor,
                )?;
            }
            PaymentResult::Failed { error_code } => {
                self.revert_to_pending(persistence, &reservation.id, error_code, actor)?;
            }
            PaymentResult::Pending { gateway_id } => {
                self.start_external(persistence, &reservation.id, provider, gateway_id, actor, false)?;
            }
            PaymentResult::Redirect { .. } => {
                self.start_external(
                    persistence,
                    &reservation.id,
                    provider,
                    &reservation.id,
                    actor,
                    false,
                )?;
            }
        }
        Ok(result)
    }

    /// Moves to EXTERNAL_PROCESSING_PAYMENT and records the pending payment row.
    ///
    /// With `acknowledged`, a reservation already processed externally moves
    /// on to WAITING_EXTERNAL_CONFIRMATION: the provider has accepted the
    /// transaction and only its final outcome is missing.
    fn start_external(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        provider: &PaymentProvider,
        gateway_id: &str,
        actor: &Actor,
        acknowledged: bool,
    ) -> Result<(), ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            match reservation.status {
                ReservationStatus::Pending | ReservationStatus::InPayment => {
                    if reservation.status == ReservationStatus::Pending {
                        transition(
                            store,
                            &mut reservation,
                            Command::StartPayment { proxy: provider.proxy },
                            actor,
                            cause("payment initiated by provider"),
                            now,
                        )?;
                    }
                    transition(
                        store,
                        &mut reservation,
                        Command::StartExternalPayment,
                        actor,
                        cause("external payment started"),
                        now,
                    )?;
                }
                ReservationStatus::ExternalProcessingPayment if acknowledged => {
                    transition(
                        store,
                        &mut reservation,
                        Command::AwaitExternalConfirmation,
                        actor,
                        cause("transaction acknowledged by provider"),
                        now,
                    )?;
                }
                _ => {}
            }
            upsert_pending_transaction(store, &reservation, provider.proxy, gateway_id, now)
        })
    }

    /// Reverts a failed attempt to PENDING and drops what the attempt held.
    fn revert_to_pending(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        reason: &str,
        actor: &Actor,
    ) -> Result<(), ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            if !reservation.status.is_payment_in_progress() || reservation.ready_for_confirmation {
                return Ok(());
            }
            transition(
                store,
                &mut reservation,
                Command::RevertToPending {
                    reason: reason.to_string(),
                },
                actor,
                cause(reason),
                now,
            )?;
            GroupManager::release(store, reservation_id)?;
            if store
                .transaction(reservation_id)?
                .is_some_and(|transaction| !transaction.is_complete())
            {
                store.delete_transaction(reservation_id)?;
            }
            info!(reservation_id, reason, "Payment failed, reservation back to pending");
            Ok(())
        })
    }

    /// After an unexpected error a reservation still IN_PAYMENT is left to
    /// the stuck sweep; other in-progress states go back to PENDING.
    fn revert_unless_in_payment(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        actor: &Actor,
    ) -> Result<(), ServiceError> {
        let status = persistence.store().reservation(reservation_id)?.status;
        if status == ReservationStatus::InPayment {
            return Ok(());
        }
        self.revert_to_pending(persistence, reservation_id, codes::PAYMENT_UNEXPECTED, actor)
    }

    /// Confirms a bank transfer or a stuck payment.
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
        self.finalizer.confirm_offline_payment(persistence, reservation_id, actor)
    }

    // ========================================================================
    // Organizer operations
    // ========================================================================

    /// Cancels a reservation and gives back everything it holds.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` unless the reservation is PENDING,
    /// awaiting a transfer or stuck.
    pub fn cancel_reservation(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        notify: bool,
        actor: &Actor,
    ) -> Result<(), ServiceError> {
        let now = self.context.now();
        let (reservation, event) = persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            let event = store.event(reservation.event_id)?;
            transition(
                store,
                &mut reservation,
                Command::Cancel { expired: false },
                actor,
                cause("reservation cancelled"),
                now,
            )?;
            release_reservation_resources(store, &reservation, &event, WaitingQueueStatus::Cancelled)?;
            Ok::<_, ServiceError>((reservation, event))
        })?;

        info!(reservation_id, event_id = event.id, "Reservation cancelled");
        self.context
            .hooks
            .reservations_cancelled(event.id, &[reservation.id.clone()]);
        if notify && let Some(email) = reservation.customer.email.as_deref() {
            self.context.notify(
                &event,
                "reservation-cancelled",
                Some(reservation_id),
                email,
                "Your reservation has been cancelled",
                &|| format!("Reservation {reservation_id} for {} has been cancelled", event.short_name),
            );
        }
        Ok(())
    }

    /// Cancels the invoice of a completed reservation with a credit note.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleState` unless the reservation is COMPLETE and invoiced.
    pub fn issue_credit_note(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        actor: &Actor,
    ) -> Result<BillingDocument, ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            let Some(invoice_number) = reservation.invoice_number.clone() else {
                return Err(CoreError::incompatible(reservation_id, reservation.status).into());
            };
            let event = store.event(reservation.event_id)?;
            transition(
                store,
                &mut reservation,
                Command::IssueCreditNote,
                actor,
                cause("credit note issued"),
                now,
            )?;
            let document =
                BillingDocumentManager::create_credit_note(store, &event, &reservation, &invoice_number, now)?;
            release_reservation_resources(store, &reservation, &event, WaitingQueueStatus::Cancelled)?;
            info!(reservation_id, number = %document.number, "Credit note issued");
            Ok(document)
        })
    }

    /// Gives back one ticket of a completed reservation.
    ///
    /// Releasing the last ticket cancels the reservation.
    ///
    /// # Errors
    ///
    /// * `NotFound` - the ticket is not part of the reservation
    /// * `IncompatibleState` - the reservation is not COMPLETE or the ticket
    ///   belongs to a restricted category
    pub fn release_ticket(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        ticket_id: i64,
        actor: &Actor,
    ) -> Result<(), ServiceError> {
        let now = self.context.now();
        persistence.transaction(|store| {
            let mut reservation = store.lock_reservation(reservation_id)?;
            let tickets = store.tickets_by_reservation(reservation_id)?;
            let ticket = tickets
                .iter()
                .find(|t| t.id == ticket_id)
                .ok_or_else(|| CoreError::not_found("ticket", ticket_id))?;
            if let Some(category_id) = ticket.category_id
                && store.category(category_id)?.access_restricted
            {
                return Err(CoreError::incompatible(reservation_id, reservation.status).into());
            }
            let event = store.event(reservation.event_id)?;
            let last = tickets.len() == 1;

            store.delete_acquisition_for_ticket(ticket_id)?;
            store.release_tickets(&[ticket_id], released_ticket_status(&event))?;
            if last {
                release_reservation_resources(store, &reservation, &event, WaitingQueueStatus::Cancelled)?;
            }
            let promo = Self::reservation_promo(store, &reservation)?;
            let discount = promo.as_ref().and_then(PromoCodeDiscount::discount);
            refresh_totals(store, &mut reservation, discount.as_ref())?;
            transition(
                store,
                &mut reservation,
                Command::ReleaseTicket { last },
                actor,
                cause("ticket released"),
                now,
            )?;
            info!(reservation_id, ticket_id, last, "Ticket released");
            Ok(())
        })
    }

    // ========================================================================
    // Sweeps
    // ========================================================================

    /// Cancels PENDING reservations past their validity and bank transfers
    /// past their deadline.
    ///
    /// Returns the number of reservations cancelled. A reservation that
    /// fails is logged and retried on the next sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if the candidates cannot be listed.
    pub fn cleanup_expired_reservations(
        &self,
        persistence: &mut Persistence,
    ) -> Result<usize, ServiceError> {
        let now = self.context.now();
        let candidates = persistence
            .store()
            .reservations_expired_before(EXPIRABLE_STATUSES, now)?;
        let actor = Actor::system();
        let mut expired: BTreeMap<i64, Vec<String>> = BTreeMap::new();

        for candidate in candidates {
            let outcome = persistence.transaction(|store| {
                let mut reservation = store.lock_reservation(&candidate.id)?;
                if !EXPIRABLE_STATUSES.contains(&reservation.status) || !reservation.is_expired(now) {
                    return Ok(false);
                }
                let event = store.event(reservation.event_id)?;
                transition(
                    store,
                    &mut reservation,
                    Command::Cancel { expired: true },
                    &actor,
                    cause("reservation expired"),
                    now,
                )?;
                release_reservation_resources(store, &reservation, &event, WaitingQueueStatus::Expired)?;
                Ok::<_, ServiceError>(true)
            });
            match outcome {
                Ok(true) => expired.entry(candidate.event_id).or_default().push(candidate.id),
                Ok(false) => {}
                Err(err) => warn!(reservation_id = %candidate.id, error = %err, "Could not expire reservation"),
            }
        }

        let count = expired.values().map(Vec::len).sum();
        for (event_id, ids) in &expired {
            self.context.hooks.reservations_expired(*event_id, ids);
        }
        if count > 0 {
            info!(count, "Expired reservations cleaned up");
        }
        Ok(count)
    }

    /// Marks payments that never came back as STUCK and warns organizers.
    ///
    /// # Errors
    ///
    /// Returns an error if the candidates cannot be listed.
    pub fn mark_stuck_reservations(
        &self,
        persistence: &mut Persistence,
    ) -> Result<usize, ServiceError> {
        let now = self.context.now();
        let threshold = now - self.context.settings.stuck_grace_period;
        let candidates = persistence
            .store()
            .reservations_expired_before(IN_PAYMENT_STATUSES, threshold)?;
        let actor = Actor::system();
        let mut stuck: BTreeMap<i64, Vec<String>> = BTreeMap::new();

        for candidate in candidates {
            let outcome = persistence.transaction(|store| {
                let mut reservation = store.lock_reservation(&candidate.id)?;
                if !reservation.status.is_payment_in_progress() || reservation.validity >= threshold {
                    return Ok(false);
                }
                transition(
                    store,
                    &mut reservation,
                    Command::MarkStuck,
                    &actor,
                    cause("payment never completed"),
                    now,
                )?;
                Ok::<_, ServiceError>(true)
            });
            match outcome {
                Ok(true) => stuck.entry(candidate.event_id).or_default().push(candidate.id),
                Ok(false) => {}
                Err(err) => warn!(reservation_id = %candidate.id, error = %err, "Could not mark reservation stuck"),
            }
        }

        let mut count = 0;
        for (event_id, ids) in &stuck {
            count += ids.len();
            self.context.hooks.reservations_stuck(*event_id, ids);
            let event = persistence.store().event(*event_id)?;
            warn!(event_id, count = ids.len(), "Reservations stuck in payment");
            self.context.notify(
                &event,
                "reservations-stuck",
                None,
                &self.context.settings.organizer_email,
                "Reservations stuck in payment",
                &|| format!("Stuck reservations for {}: {}", event.short_name, ids.join(", ")),
            );
        }
        Ok(count)
    }

    /// Confirms the bank transfers an offline processor has matched.
    ///
    /// Returns the ids of the confirmed reservations.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending reservations cannot be listed.
    pub fn check_pending_offline_payments(
        &self,
        persistence: &mut Persistence,
        event_id: i64,
    ) -> Result<Vec<String>, ServiceError> {
        let pending = persistence
            .store()
            .reservations_by_status(event_id, OFFLINE_STATUSES)?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }
        let mut matched: Vec<String> = Vec::new();
        for provider in self
            .payments
            .providers()
            .iter()
            .filter(|p| p.active && p.has(Capability::OfflineProcessor))
        {
            for id in provider.check_pending_reservations(&pending) {
                if !matched.contains(&id) && pending.iter().any(|r| r.id == id) {
                    matched.push(id);
                }
            }
        }

        let actor = Actor::new(String::from("offline-processor"), ActorKind::PaymentProvider);
        let mut confirmed = Vec::with_capacity(matched.len());
        for id in matched {
            match self.finalizer.confirm_offline_payment(persistence, &id, &actor) {
                Ok(()) => confirmed.push(id),
                Err(err) => warn!(reservation_id = %id, error = %err, "Matched transfer could not be confirmed"),
            }
        }
        Ok(confirmed)
    }

    /// Runs due admin jobs, currently finalization retries.
    ///
    /// # Errors
    ///
    /// Returns an error if jobs cannot be claimed or updated.
    pub fn process_admin_jobs(
        &self,
        persistence: &mut Persistence,
    ) -> Result<JobRunSummary, ServiceError> {
        let now = self.context.now();
        AdminJobManager::execute_due(persistence, &self.context.settings, now, |persistence, job| {
            if job.job_name != FINALIZE_RESERVATION_JOB {
                return Err(CoreError::not_found("job handler", job.job_name.as_str()).into());
            }
            let payload: FinalizePayload =
                serde_json::from_value(job.payload.clone()).map_err(PersistenceError::from)?;
            let outcome = self.finalizer.complete(
                persistence,
                &payload.reservation_id,
                payload.proxy,
                payload.gateway_id.as_deref(),
                &Actor::system(),
            )?;
            debug!(reservation_id = %payload.reservation_id, ?outcome, "Finalization retried");
            Ok(())
        })
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Applies a provider notification to its reservation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown provider or reservation.
    pub fn process_webhook(
        &self,
        persistence: &mut Persistence,
        provider_id: &str,
        payload: &serde_json::Value,
    ) -> Result<WebhookStatus, ServiceError> {
        let provider = self
            .payments
            .provider_by_id(provider_id)
            .ok_or_else(|| CoreError::not_found("payment provider", provider_id))?;
        if !provider.has(Capability::WebhookHandler) {
            return Ok(WebhookStatus::NotRelevant);
        }
        let Some(webhook) = provider.process_webhook(payload) else {
            return Ok(WebhookStatus::NotRelevant);
        };
        let Some(reservation_id) = webhook.reservation_id.as_deref() else {
            return Ok(webhook.status);
        };
        let actor = Actor::new(provider.id.clone(), ActorKind::PaymentProvider);
        let gateway_id = webhook.gateway_id.as_deref().unwrap_or(reservation_id);
        debug!(reservation_id, provider = %provider.id, status = ?webhook.status, "Webhook received");

        match webhook.status {
            WebhookStatus::NotRelevant => {}
            WebhookStatus::TransactionInitiated => {
                self.start_external(persistence, reservation_id, provider, gateway_id, &actor, true)?;
            }
            WebhookStatus::Successful => {
                let outcome = self.finalizer.finalize_reservation(
                    persistence,
                    reservation_id,
                    provider.proxy,
                    Some(gateway_id),
                    &actor,
                )?;
                if outcome == FinalizeOutcome::AlreadyFinalized {
                    debug!(reservation_id, "Duplicate success notification");
                }
            }
            WebhookStatus::Failed
            | WebhookStatus::Cancelled
            | WebhookStatus::Error
            | WebhookStatus::Rejected => {
                let reason = format!("webhook {:?}", webhook.status);
                self.revert_to_pending(persistence, reservation_id, &reason, &actor)?;
            }
        }
        Ok(webhook.status)
    }

    /// Creates the provider transaction of a redirect flow.
    ///
    /// # Errors
    ///
    /// * `CannotProceedWithPayment` - no server-initiating provider handles the payment
    /// * `Provider` - the provider refused
    pub fn init_transaction(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        request: &PaymentRequest,
        actor: &Actor,
    ) -> Result<TransactionInit, ServiceError> {
        let reservation = persistence.store().reservation(reservation_id)?;
        let context = PaymentContext {
            event_id: reservation.event_id,
            proxy: request.proxy,
            method: request.method,
            amount: reservation.final_price,
            currency: reservation.currency.clone(),
        };
        let provider = self
            .payments
            .lookup_provider(&context)
            .filter(|p| p.has(Capability::ServerInitiatedTransaction))
            .ok_or(CoreError::CannotProceedWithPayment)?;
        let spec = payment_specification(&reservation, request);
        let init = provider
            .init_transaction(&spec)
            .map_err(|message| ServiceError::Provider {
                provider: provider.id.clone(),
                message,
            })?;
        self.start_external(persistence, reservation_id, provider, &init.gateway_id, actor, false)?;
        info!(
            reservation_id,
            provider = %provider.id,
            gateway_id = %init.gateway_id,
            "Provider transaction initialized"
        );
        Ok(init)
    }

    /// Discards the pending provider transaction of a reservation.
    ///
    /// Returns `false` when there is nothing the provider agreed to discard.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn discard_transaction(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
        actor: &Actor,
    ) -> Result<bool, ServiceError> {
        let Some(transaction) = persistence.store().transaction(reservation_id)? else {
            return Ok(false);
        };
        if transaction.is_complete() {
            return Ok(false);
        }
        let discarded = self
            .payments
            .provider_for_proxy(transaction.payment_proxy)
            .filter(|p| p.has(Capability::ServerInitiatedTransaction))
            .is_some_and(|p| p.discard_transaction(&transaction));
        if discarded {
            self.revert_to_pending(persistence, reservation_id, "transaction discarded", actor)?;
            persistence.store().delete_transaction(reservation_id)?;
            info!(reservation_id, "Provider transaction discarded");
        }
        Ok(discarded)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current cost of a reservation, recomputed from its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the reservation does not exist.
    pub fn total_reservation_cost(
        &self,
        persistence: &mut Persistence,
        reservation_id: &str,
    ) -> Result<TotalPrice, ServiceError> {
        let mut store = persistence.store();
        let mut reservation = store.reservation(reservation_id)?;
        let promo = Self::reservation_promo(&mut store, &reservation)?;
        let discount: Option<Discount> = promo.as_ref().and_then(PromoCodeDiscount::discount);
        refresh_totals(&mut store, &mut reservation, discount.as_ref())
    }

    fn reservation_promo(
        store: &mut Store<'_>,
        reservation: &Reservation,
    ) -> Result<Option<PromoCodeDiscount>, ServiceError> {
        reservation
            .promo_code_id
            .map(|id| store.promo_code_by_id(id))
            .transpose()
            .map_err(ServiceError::from)
    }
}

/// What the provider is asked to charge.
fn payment_specification(reservation: &Reservation, request: &PaymentRequest) -> PaymentSpecification {
    PaymentSpecification {
        reservation_id: reservation.id.clone(),
        event_id: reservation.event_id,
        amount: reservation.final_price,
        currency: reservation.currency.clone(),
        email: reservation.customer.email.clone().unwrap_or_default(),
        customer_name: reservation.customer.full_name.clone().unwrap_or_default(),
        description: format!("Reservation {}", reservation.id),
        method: request.method,
        gateway_token: request.gateway_token.clone(),
        idempotency_key: format!("{}-{}", reservation.id, request.proxy),
    }
}

/// Records a payment the provider has started but not confirmed.
fn upsert_pending_transaction(
    store: &mut Store<'_>,
    reservation: &Reservation,
    proxy: PaymentProxy,
    gateway_id: &str,
    now: OffsetDateTime,
) -> Result<(), ServiceError> {
    if let Some(mut existing) = store.transaction(&reservation.id)? {
        if existing.is_complete() {
            return Ok(());
        }
        existing.gateway_transaction_id = gateway_id.to_string();
        existing.payment_proxy = proxy;
        existing.status = TransactionStatus::Pending;
        store.update_transaction(&existing)?;
        return Ok(());
    }
    store.insert_transaction(&Transaction {
        id: 0,
        reservation_id: reservation.id.clone(),
        gateway_transaction_id: gateway_id.to_string(),
        gateway_payment_id: None,
        amount: reservation.final_price,
        currency: reservation.currency.clone(),
        description: format!("Reservation {}", reservation.id),
        payment_proxy: proxy,
        platform_fee: 0,
        gateway_fee: 0,
        status: TransactionStatus::Pending,
        created_at: now,
        metadata: serde_json::json!({}),
    })?;
    Ok(())
}
