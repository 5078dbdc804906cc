// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Access token and promo code writes.

use alfio_domain::{PromoCodeDiscount, SpecialPrice, SpecialPriceStatus};
use diesel::prelude::*;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::data_models::from_timestamp;
use crate::diesel_schema::{promo_codes, special_prices};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts an access token and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails or the code already exists.
pub fn insert_special_price(conn: &mut _, token: &SpecialPrice) -> Result<i64, PersistenceError> {
    diesel::insert_into(special_prices::table)
        .values((
            special_prices::code.eq(&token.code),
            special_prices::category_id.eq(token.category_id),
            special_prices::price.eq(token.price),
            special_prices::status.eq(token.status.as_str()),
            special_prices::reservation_id.eq(token.reservation_id.as_deref()),
            special_prices::access_code_id.eq(token.access_code_id),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Binds a FREE token to a reservation.
///
/// Returns `false` when the token is no longer FREE.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn bind_special_price(
    conn: &mut _,
    token_id: i64,
    reservation_id: &str,
) -> Result<bool, PersistenceError> {
    let updated: usize = diesel::update(special_prices::table)
        .filter(special_prices::id.eq(token_id))
        .filter(special_prices::status.eq(SpecialPriceStatus::Free.as_str()))
        .set((
            special_prices::status.eq(SpecialPriceStatus::Pending.as_str()),
            special_prices::reservation_id.eq(reservation_id),
        ))
        .execute(conn)?;
    Ok(updated == 1)
}
}

backend_fn! {
/// Binds claimed tokens to a reservation on behalf of an access code.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn bind_tokens_to_access_code(
    conn: &mut _,
    token_ids: &[i64],
    reservation_id: &str,
    access_code_id: i64,
) -> Result<usize, PersistenceError> {
    let bound: usize = diesel::update(special_prices::table)
        .filter(special_prices::id.eq_any(token_ids))
        .filter(special_prices::status.eq(SpecialPriceStatus::Free.as_str()))
        .set((
            special_prices::status.eq(SpecialPriceStatus::Pending.as_str()),
            special_prices::reservation_id.eq(reservation_id),
            special_prices::access_code_id.eq(access_code_id),
        ))
        .execute(conn)?;
    debug!(reservation_id, access_code_id, bound, "Bound access tokens");
    Ok(bound)
}
}

backend_fn! {
/// Moves every token bound to a reservation to `status`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_special_price_status_for_reservation(
    conn: &mut _,
    reservation_id: &str,
    status: SpecialPriceStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(special_prices::table)
        .filter(special_prices::reservation_id.eq(reservation_id))
        .set(special_prices::status.eq(status.as_str()))
        .execute(conn)?)
}
}

backend_fn! {
/// Returns the tokens of a reservation to FREE and unbinds them.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn reset_special_prices_for_reservation(
    conn: &mut _,
    reservation_id: &str,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(special_prices::table)
        .filter(special_prices::reservation_id.eq(reservation_id))
        .set((
            special_prices::status.eq(SpecialPriceStatus::Free.as_str()),
            special_prices::reservation_id.eq(None::<String>),
            special_prices::access_code_id.eq(None::<i64>),
        ))
        .execute(conn)?)
}
}

backend_fn! {
/// Inserts a promo code and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails or the category set cannot be
/// serialized.
pub fn insert_promo_code(conn: &mut _, promo: &PromoCodeDiscount) -> Result<i64, PersistenceError> {
    let categories: String = serde_json::to_string(&promo.categories)?;
    diesel::insert_into(promo_codes::table)
        .values((
            promo_codes::code.eq(&promo.code),
            promo_codes::event_id.eq(promo.event_id),
            promo_codes::organization_id.eq(promo.organization_id),
            promo_codes::code_type.eq(promo.code_type.as_str()),
            promo_codes::discount_type.eq(promo.discount_type.as_str()),
            promo_codes::discount_amount.eq(promo.discount_amount),
            promo_codes::categories.eq(categories),
            promo_codes::hidden_category_id.eq(promo.hidden_category_id),
            promo_codes::max_usage.eq(promo.max_usage.map(i64::from)),
            promo_codes::valid_from.eq(from_timestamp(promo.valid_from)),
            promo_codes::valid_to.eq(from_timestamp(promo.valid_to)),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}
