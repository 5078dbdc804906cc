// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Promo code and access token (special price) queries.

use alfio_domain::{PromoCodeDiscount, SpecialPrice, SpecialPriceStatus};
use diesel::prelude::*;

use crate::data_models::{PromoCodeRow, SpecialPriceRow};
use crate::diesel_schema::{promo_codes, special_prices};
use crate::error::PersistenceError;

backend_fn! {
/// Looks up an access token by its code.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_special_price_by_code(
    conn: &mut _,
    code: &str,
) -> Result<Option<SpecialPrice>, PersistenceError> {
    special_prices::table
        .filter(special_prices::code.eq(code))
        .select(SpecialPriceRow::as_select())
        .first(conn)
        .optional()?
        .map(SpecialPrice::try_from)
        .transpose()
}
}

backend_fn! {
/// Loads the tokens bound to a reservation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_special_prices_by_reservation(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Vec<SpecialPrice>, PersistenceError> {
    special_prices::table
        .filter(special_prices::reservation_id.eq(reservation_id))
        .order(special_prices::id.asc())
        .select(SpecialPriceRow::as_select())
        .load(conn)?
        .into_iter()
        .map(SpecialPrice::try_from)
        .collect()
}
}

backend_fn! {
/// Looks up a promo code usable for an event.
///
/// A code defined on the event wins over an organization-wide one.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_promo_code(
    conn: &mut _,
    event_id: i64,
    organization_id: i64,
    code: &str,
) -> Result<Option<PromoCodeDiscount>, PersistenceError> {
    let rows: Vec<PromoCodeRow> = promo_codes::table
        .filter(promo_codes::code.eq(code))
        .filter(
            promo_codes::event_id.eq(event_id).or(promo_codes::event_id
                .is_null()
                .and(promo_codes::organization_id.eq(organization_id))),
        )
        .select(PromoCodeRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .max_by_key(|row| row.event_id.is_some())
        .map(PromoCodeDiscount::try_from)
        .transpose()
}
}

backend_fn! {
/// Loads a promo code by id.
///
/// # Errors
///
/// Returns `NotFound` if the promo code does not exist.
pub fn find_promo_code_by_id(conn: &mut _, promo_code_id: i64) -> Result<PromoCodeDiscount, PersistenceError> {
    let row: PromoCodeRow = promo_codes::table
        .find(promo_code_id)
        .select(PromoCodeRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("promo code", promo_code_id))?;
    PromoCodeDiscount::try_from(row)
}
}

/// Loads a promo code for update.
///
/// # Errors
///
/// Returns `NotFound` if the promo code does not exist.
pub fn lock_promo_code_sqlite(
    conn: &mut diesel::SqliteConnection,
    promo_code_id: i64,
) -> Result<PromoCodeDiscount, PersistenceError> {
    find_promo_code_by_id_sqlite(conn, promo_code_id)
}

/// Loads a promo code for update.
///
/// # Errors
///
/// Returns `NotFound` if the promo code does not exist.
#[cfg(feature = "mysql")]
pub fn lock_promo_code_mysql(
    conn: &mut diesel::MysqlConnection,
    promo_code_id: i64,
) -> Result<PromoCodeDiscount, PersistenceError> {
    let row: PromoCodeRow = promo_codes::table
        .find(promo_code_id)
        .select(PromoCodeRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("promo code", promo_code_id))?;
    PromoCodeDiscount::try_from(row)
}

/// Claims up to `limit` free, unbound tokens of a category.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_free_tokens_sqlite(
    conn: &mut diesel::SqliteConnection,
    category_id: i64,
    limit: u32,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(special_prices::table
        .filter(special_prices::category_id.eq(category_id))
        .filter(special_prices::status.eq(SpecialPriceStatus::Free.as_str()))
        .filter(special_prices::reservation_id.is_null())
        .filter(special_prices::access_code_id.is_null())
        .select(special_prices::id)
        .order(special_prices::id.asc())
        .limit(i64::from(limit))
        .load(conn)?)
}

/// Claims up to `limit` free, unbound tokens of a category.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_free_tokens_mysql(
    conn: &mut diesel::MysqlConnection,
    category_id: i64,
    limit: u32,
) -> Result<Vec<i64>, PersistenceError> {
    Ok(special_prices::table
        .filter(special_prices::category_id.eq(category_id))
        .filter(special_prices::status.eq(SpecialPriceStatus::Free.as_str()))
        .filter(special_prices::reservation_id.is_null())
        .filter(special_prices::access_code_id.is_null())
        .select(special_prices::id)
        .order(special_prices::id.asc())
        .limit(i64::from(limit))
        .for_update()
        .skip_locked()
        .load(conn)?)
}
