// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment transaction and additional service queries.

use alfio_domain::{AdditionalService, AdditionalServiceItem, Transaction};
use diesel::prelude::*;

use crate::data_models::{AdditionalServiceItemRow, AdditionalServiceRow, TransactionRow};
use crate::diesel_schema::{additional_service_items, additional_services, transactions};
use crate::error::PersistenceError;

backend_fn! {
/// Finds the payment transaction of a reservation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_transaction(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Option<Transaction>, PersistenceError> {
    transactions::table
        .filter(transactions::reservation_id.eq(reservation_id))
        .select(TransactionRow::as_select())
        .first(conn)
        .optional()?
        .map(Transaction::try_from)
        .transpose()
}
}

backend_fn! {
/// Loads the active additional services of an event.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_additional_services(
    conn: &mut _,
    event_id: i64,
) -> Result<Vec<AdditionalService>, PersistenceError> {
    additional_services::table
        .filter(additional_services::event_id.eq(event_id))
        .filter(additional_services::active.eq(true))
        .order(additional_services::id.asc())
        .select(AdditionalServiceRow::as_select())
        .load(conn)?
        .into_iter()
        .map(AdditionalService::try_from)
        .collect()
}
}

backend_fn! {
/// Loads the additional service items of a reservation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_additional_service_items(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Vec<AdditionalServiceItem>, PersistenceError> {
    additional_service_items::table
        .filter(additional_service_items::reservation_id.eq(reservation_id))
        .order(additional_service_items::id.asc())
        .select(AdditionalServiceItemRow::as_select())
        .load(conn)?
        .into_iter()
        .map(AdditionalServiceItem::try_from)
        .collect()
}
}
