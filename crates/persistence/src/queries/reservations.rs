// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reservation queries.

use alfio_domain::{Reservation, ReservationStatus};
use diesel::prelude::*;
use time::OffsetDateTime;

use crate::data_models::{ReservationRow, from_timestamp, to_u32};
use crate::diesel_schema::{reservations, tickets};
use crate::error::PersistenceError;

fn reservation_status_texts(statuses: &[ReservationStatus]) -> Vec<&'static str> {
    statuses.iter().map(ReservationStatus::as_str).collect()
}

backend_fn! {
/// Loads a reservation.
///
/// # Errors
///
/// Returns `NotFound` if the reservation does not exist.
pub fn find_reservation(conn: &mut _, reservation_id: &str) -> Result<Reservation, PersistenceError> {
    let row: ReservationRow = reservations::table
        .find(reservation_id)
        .select(ReservationRow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("reservation", reservation_id))?;
    Reservation::try_from(row)
}
}

backend_fn! {
/// Loads the reservations in one of `statuses` whose validity ended before `before`.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn find_reservations_expired_before(
    conn: &mut _,
    statuses: &[ReservationStatus],
    before: OffsetDateTime,
) -> Result<Vec<Reservation>, PersistenceError> {
    reservations::table
        .filter(reservations::status.eq_any(reservation_status_texts(statuses)))
        .filter(reservations::validity.lt(from_timestamp(before)))
        .order(reservations::validity.asc())
        .select(ReservationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Reservation::try_from)
        .collect()
}
}

backend_fn! {
/// Loads the reservations of an event in one of `statuses`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row is invalid.
pub fn find_reservations_by_status(
    conn: &mut _,
    event_id: i64,
    statuses: &[ReservationStatus],
) -> Result<Vec<Reservation>, PersistenceError> {
    reservations::table
        .filter(reservations::event_id.eq(event_id))
        .filter(reservations::status.eq_any(reservation_status_texts(statuses)))
        .order(reservations::created_at.asc())
        .select(ReservationRow::as_select())
        .load(conn)?
        .into_iter()
        .map(Reservation::try_from)
        .collect()
}
}

backend_fn! {
/// Counts the tickets already sold with a promo code.
///
/// Only reservations in one of `statuses` count, and `exclude_reservation`
/// never counts against itself.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_promo_code_usage(
    conn: &mut _,
    promo_code_id: i64,
    statuses: &[ReservationStatus],
    exclude_reservation: &str,
) -> Result<u32, PersistenceError> {
    let count: i64 = tickets::table
        .inner_join(reservations::table)
        .filter(reservations::promo_code_id.eq(promo_code_id))
        .filter(reservations::status.eq_any(reservation_status_texts(statuses)))
        .filter(reservations::id.ne(exclude_reservation))
        .count()
        .get_result(conn)?;
    to_u32(count, "promo code usage")
}
}

/// Loads a reservation for update.
///
/// # Errors
///
/// Returns `NotFound` if the reservation does not exist.
pub fn lock_reservation_sqlite(
    conn: &mut diesel::SqliteConnection,
    reservation_id: &str,
) -> Result<Reservation, PersistenceError> {
    find_reservation_sqlite(conn, reservation_id)
}

/// Loads a reservation for update.
///
/// # Errors
///
/// Returns `NotFound` if the reservation does not exist.
#[cfg(feature = "mysql")]
pub fn lock_reservation_mysql(
    conn: &mut diesel::MysqlConnection,
    reservation_id: &str,
) -> Result<Reservation, PersistenceError> {
    let row: ReservationRow = reservations::table
        .find(reservation_id)
        .select(ReservationRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::not_found("reservation", reservation_id))?;
    Reservation::try_from(row)
}
