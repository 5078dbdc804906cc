// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reservation writes.

use alfio_domain::Reservation;
use diesel::prelude::*;
use tracing::debug;

use crate::data_models::ReservationChanges;
use crate::diesel_schema::reservations;
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a new reservation row.
///
/// # Errors
///
/// Returns an error if the insert fails or the id already exists.
pub fn insert_reservation(conn: &mut _, reservation: &Reservation) -> Result<(), PersistenceError> {
    diesel::insert_into(reservations::table)
        .values(ReservationChanges::from(reservation))
        .execute(conn)?;
    debug!(reservation_id = %reservation.id, "Inserted reservation");
    Ok(())
}
}

backend_fn! {
/// Overwrites every column of a reservation.
///
/// # Errors
///
/// Returns `NotFound` if the reservation does not exist.
pub fn update_reservation(conn: &mut _, reservation: &Reservation) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(reservations::table.find(&reservation.id))
        .set(ReservationChanges::from(reservation))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::not_found("reservation", &reservation.id));
    }
    Ok(())
}
}
