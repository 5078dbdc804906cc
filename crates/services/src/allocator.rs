// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seat allocation.
//!
//! Every function here runs inside the caller's transaction. A shortfall is
//! reported as an error so that the caller rolls the whole reservation back.

use alfio::{CoreError, check_special_price};
use alfio_domain::{
    AdditionalServiceItemStatus, BillingDetails, CodeType, CustomerDetails, Discount, DomainError,
    Event, PriceBreakdown, PromoCodeDiscount, Reservation, ReservationStatus, Ticket,
    TicketCategory, TicketStatus, TotalPrice, VatStatus, calculate_price, calculate_total,
};
use alfio_persistence::{Store, TicketPool};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ServiceError;
use crate::request::TicketLine;

/// Where a reservation being allocated comes from.
pub(crate) struct Allocation<'a> {
    pub event: &'a Event,
    pub reservation_id: &'a str,
    pub language: &'a str,
    pub now: OffsetDateTime,
}

/// Builds an empty PENDING reservation for `event`.
pub(crate) fn draft_reservation(
    event: &Event,
    reservation_id: &str,
    now: OffsetDateTime,
    validity: OffsetDateTime,
    language: &str,
) -> Reservation {
    Reservation {
        id: reservation_id.to_string(),
        event_id: event.id,
        status: ReservationStatus::Pending,
        validity,
        created_at: now,
        confirmed_at: None,
        currency: event.currency.clone(),
        vat_status: event.vat_status,
        vat_rate: event.vat_rate,
        src_price: 0,
        final_price: 0,
        vat: 0,
        discount: 0,
        promo_code_id: None,
        invoice_number: None,
        payment_proxy: None,
        customer: CustomerDetails::default(),
        billing: BillingDetails::default(),
        language: language.to_string(),
        ready_for_confirmation: false,
        finalized: false,
    }
}

/// The pool a category draws its tickets from.
pub(crate) const fn pool_of(category: &TicketCategory) -> TicketPool {
    TicketPool::of(category)
}

/// Claims exactly `quantity` tickets for `category` among `sources`.
///
/// # Errors
///
/// Returns `NotEnoughTickets` if fewer rows could be claimed.
pub(crate) fn reserve_tickets(
    store: &mut Store<'_>,
    event_id: i64,
    category: &TicketCategory,
    quantity: u32,
    sources: &[TicketStatus],
) -> Result<Vec<i64>, ServiceError> {
    let ids = store.lock_tickets(event_id, pool_of(category), sources, quantity)?;
    if ids.len() != quantity as usize {
        debug!(
            event_id,
            category_id = category.id,
            requested = quantity,
            claimed = ids.len(),
            "Not enough tickets"
        );
        return Err(CoreError::NotEnoughTickets.into());
    }
    Ok(ids)
}

/// Binds locked tickets to a reservation in `category`.
///
/// # Errors
///
/// Returns `NotEnoughTickets` if any of `ids` was bound elsewhere meanwhile.
pub(crate) fn bind_tickets(
    store: &mut Store<'_>,
    ids: &[i64],
    reservation_id: &str,
    category: &TicketCategory,
    language: &str,
) -> Result<(), ServiceError> {
    let bound = store.reserve_tickets(ids, reservation_id, category.id, category.src_price, language)?;
    if bound != ids.len() {
        debug!(
            reservation_id,
            category_id = category.id,
            claimed = ids.len(),
            bound,
            "Tickets taken by another reservation"
        );
        return Err(CoreError::NotEnoughTickets.into());
    }
    Ok(())
}

/// Loads a category and checks that it can be sold for `event` at `now`.
///
/// # Errors
///
/// Returns `CategoryNotOnSale` for a foreign, disabled or closed category.
pub(crate) fn category_on_sale(
    store: &mut Store<'_>,
    event: &Event,
    category_id: i64,
    now: OffsetDateTime,
) -> Result<TicketCategory, ServiceError> {
    let category = store.category(category_id)?;
    if category.event_id != event.id || !category.is_on_sale(now) {
        return Err(DomainError::CategoryNotOnSale { category_id }.into());
    }
    Ok(category)
}

/// Reserves the seats of one request line.
///
/// Restricted categories are unlocked either by a per-ticket token or by an
/// ACCESS promo code bound to the category. The claimed tickets are priced
/// immediately with `promo`'s discount when the code covers the category.
///
/// # Errors
///
/// * `MissingSpecialPriceToken` / `InvalidSpecialPriceToken` - token problems
/// * `NotEnoughTickets` - the pool or the token allowance is too small
/// * `TooManyTicketsForDiscountCode` - the access code could not bind its tokens
pub(crate) fn reserve_tickets_for_category(
    store: &mut Store<'_>,
    allocation: &Allocation<'_>,
    category: &TicketCategory,
    line: &TicketLine,
    promo: Option<&PromoCodeDiscount>,
    sources: &[TicketStatus],
) -> Result<Vec<i64>, ServiceError> {
    let access_code = promo.filter(|p| {
        p.code_type == CodeType::Access && p.hidden_category_id == Some(category.id)
    });
    if let Some(access_code) = access_code {
        bind_access_code_tokens(
            store,
            allocation.reservation_id,
            category,
            access_code,
            line.quantity,
        )?;
    } else if category.access_restricted {
        fix_token(store, allocation.reservation_id, category, line)?;
    }

    let ids = reserve_tickets(store, allocation.event.id, category, line.quantity, sources)?;
    bind_tickets(store, &ids, allocation.reservation_id, category, allocation.language)?;

    let discount = promo
        .filter(|p| p.applies_to_category(category.id))
        .and_then(PromoCodeDiscount::discount);
    price_category(
        store,
        allocation.event,
        allocation.reservation_id,
        category,
        discount.as_ref(),
        allocation.event.vat_status,
    )?;

    debug!(
        reservation_id = allocation.reservation_id,
        category_id = category.id,
        count = ids.len(),
        "Tickets reserved"
    );
    Ok(ids)
}

/// Writes the price of the reservation's tickets of `category`.
pub(crate) fn price_category(
    store: &mut Store<'_>,
    event: &Event,
    reservation_id: &str,
    category: &TicketCategory,
    discount: Option<&Discount>,
    vat_status: VatStatus,
) -> Result<(), ServiceError> {
    let price = calculate_price(category.src_price, vat_status, event.vat_rate, discount)?;
    store.update_ticket_prices(reservation_id, category.id, &price, vat_status)?;
    Ok(())
}

/// Validates and binds the per-ticket token of a restricted line.
fn fix_token(
    store: &mut Store<'_>,
    reservation_id: &str,
    category: &TicketCategory,
    line: &TicketLine,
) -> Result<(), ServiceError> {
    let code = line.special_price_code.as_deref();
    let token = match code {
        Some(code) => store.special_price_by_code(code)?,
        None => None,
    };
    check_special_price(category, code, token.as_ref(), line.quantity)?;

    let Some(token) = token else {
        return Ok(());
    };
    if !store.bind_special_price(token.id, reservation_id)? {
        // taken by a concurrent reservation since it was read
        return Err(CoreError::InvalidSpecialPriceToken { code: token.code }.into());
    }
    Ok(())
}

/// Binds `quantity` FREE tokens of the hidden category to an access code.
fn bind_access_code_tokens(
    store: &mut Store<'_>,
    reservation_id: &str,
    category: &TicketCategory,
    access_code: &PromoCodeDiscount,
    quantity: u32,
) -> Result<(), ServiceError> {
    store.lock_promo_code(access_code.id)?;
    let tokens = store.lock_free_tokens(category.id, quantity)?;
    if tokens.len() < quantity as usize {
        return Err(CoreError::NotEnoughTickets.into());
    }
    let bound = store
        .bind_tokens_to_access_code(&tokens, reservation_id, access_code.id)
        .map_err(|_| ServiceError::from(CoreError::TooManyTicketsForDiscountCode))?;
    if bound != tokens.len() {
        return Err(CoreError::TooManyTicketsForDiscountCode.into());
    }
    Ok(())
}

/// Recomputes the totals of `reservation` from its tickets and supplements.
///
/// Only a reservation-level discount is passed as `discount`; per-ticket
/// discounts are already part of the ticket prices.
pub(crate) fn refresh_totals(
    store: &mut Store<'_>,
    reservation: &mut Reservation,
    discount: Option<&Discount>,
) -> Result<TotalPrice, ServiceError> {
    let mut items: Vec<PriceBreakdown> = store
        .tickets_by_reservation(&reservation.id)?
        .iter()
        .map(Ticket::price)
        .collect();
    items.extend(
        store
            .additional_service_items(&reservation.id)?
            .iter()
            .filter(|item| item.status != AdditionalServiceItemStatus::Cancelled)
            .map(|item| PriceBreakdown {
                src_price: item.src_price,
                discount: item.discount,
                vat: item.vat,
                final_price: item.final_price,
            }),
    );
    let total = calculate_total(&items, discount);
    reservation.src_price = total.src_price;
    reservation.final_price = total.price_with_vat;
    reservation.vat = total.vat;
    reservation.discount = total.discount;
    Ok(total)
}
