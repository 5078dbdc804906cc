// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Promo code resolution and usage caps.

use alfio::{CoreError, DynamicDiscount};
use alfio_domain::{CodeType, Event, PromoCodeDiscount, Reservation, ReservationStatus, Ticket};
use alfio_persistence::Store;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::ServiceError;

/// Reservation statuses whose tickets consume promo code usage.
pub const USAGE_COUNTED_STATUSES: &[ReservationStatus] = &[
    ReservationStatus::InPayment,
    ReservationStatus::ExternalProcessingPayment,
    ReservationStatus::WaitingExternalConfirmation,
    ReservationStatus::OfflinePayment,
    ReservationStatus::DeferredOfflinePayment,
    ReservationStatus::Complete,
    ReservationStatus::Stuck,
];

/// Looks up promo codes and enforces their usage caps.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromoCodeManager;

impl PromoCodeManager {
    /// Resolves `code` for `event`, preferring a code of the event over one
    /// of its organization.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPromoCode` if the code is unknown or not active at `now`.
    pub fn resolve(
        store: &mut Store<'_>,
        event: &Event,
        code: &str,
        now: OffsetDateTime,
    ) -> Result<PromoCodeDiscount, ServiceError> {
        let code = code.trim();
        let promo = store
            .promo_code(event.id, event.organization_id, code)?
            .filter(|promo| promo.is_active_at(now))
            .ok_or_else(|| CoreError::InvalidPromoCode {
                code: code.to_string(),
            })?;
        debug!(event_id = event.id, promo_code_id = promo.id, "Promo code resolved");
        Ok(promo)
    }

    /// Persists a discount created by an extension.
    ///
    /// Extensions usually hand out the same code to many buyers; a code
    /// already stored for the event or its organization is reused.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup or the insert fails.
    pub fn persist_dynamic(
        store: &mut Store<'_>,
        event: &Event,
        dynamic: &DynamicDiscount,
        now: OffsetDateTime,
    ) -> Result<PromoCodeDiscount, ServiceError> {
        if let Some(existing) = store.promo_code(event.id, event.organization_id, &dynamic.code)? {
            debug!(event_id = event.id, promo_code_id = existing.id, "Dynamic discount reused");
            return Ok(existing);
        }
        let mut promo = PromoCodeDiscount {
            id: 0,
            code: dynamic.code.clone(),
            event_id: Some(event.id),
            organization_id: event.organization_id,
            code_type: CodeType::Dynamic,
            discount_type: dynamic.discount.discount_type,
            discount_amount: dynamic.discount.amount,
            categories: Vec::new(),
            hidden_category_id: None,
            max_usage: None,
            valid_from: now,
            valid_to: event.end,
        };
        promo.id = store.insert_promo_code(&promo)?;
        info!(event_id = event.id, code = %promo.code, "Dynamic discount created");
        Ok(promo)
    }

    /// Number of `tickets` the code applies to.
    #[must_use]
    pub fn discounted_tickets(promo: &PromoCodeDiscount, tickets: &[Ticket]) -> u32 {
        let count = tickets
            .iter()
            .filter(|t| t.category_id.is_some_and(|c| promo.applies_to_category(c)))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Checks that `reservation` does not push the code beyond its cap.
    ///
    /// Tickets of other reservations in [`USAGE_COUNTED_STATUSES`] count as
    /// used; the reservation itself never counts against itself.
    ///
    /// # Errors
    ///
    /// Returns `TooManyTicketsForDiscountCode` when the cap would be exceeded.
    pub fn check_usage(
        store: &mut Store<'_>,
        promo: &PromoCodeDiscount,
        reservation: &Reservation,
        requested: u32,
    ) -> Result<(), ServiceError> {
        if promo.max_usage.is_none() {
            return Ok(());
        }
        let used = store.count_promo_code_usage(promo.id, USAGE_COUNTED_STATUSES, &reservation.id)?;
        if promo.exceeds_usage(used, requested) {
            info!(
                reservation_id = %reservation.id,
                promo_code_id = promo.id,
                used,
                requested,
                "Promo code usage exceeded"
            );
            return Err(CoreError::TooManyTicketsForDiscountCode.into());
        }
        Ok(())
    }
}
