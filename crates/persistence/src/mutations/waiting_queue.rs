// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Waiting queue writes.

use alfio_domain::{WaitingQueueStatus, WaitingQueueSubscription};
use diesel::prelude::*;

use crate::backend::PersistenceBackend;
use crate::data_models::from_timestamp;
use crate::diesel_schema::waiting_queue;
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a subscription and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_subscription(
    conn: &mut _,
    subscription: &WaitingQueueSubscription,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(waiting_queue::table)
        .values((
            waiting_queue::event_id.eq(subscription.event_id),
            waiting_queue::full_name.eq(&subscription.full_name),
            waiting_queue::email.eq(&subscription.email),
            waiting_queue::language.eq(&subscription.language),
            waiting_queue::selected_category_id.eq(subscription.selected_category_id),
            waiting_queue::subscription_type.eq(subscription.subscription_type.as_str()),
            waiting_queue::status.eq(subscription.status.as_str()),
            waiting_queue::reservation_id.eq(subscription.reservation_id.as_deref()),
            waiting_queue::created_at.eq(from_timestamp(subscription.created_at)),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Sets the status and offered reservation of a subscription.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_subscription(
    conn: &mut _,
    subscription_id: i64,
    status: WaitingQueueStatus,
    reservation_id: Option<&str>,
) -> Result<(), PersistenceError> {
    diesel::update(waiting_queue::table.find(subscription_id))
        .set((
            waiting_queue::status.eq(status.as_str()),
            waiting_queue::reservation_id.eq(reservation_id),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Moves the subscription holding a reservation to `status`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_subscription_status_for_reservation(
    conn: &mut _,
    reservation_id: &str,
    status: WaitingQueueStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(waiting_queue::table)
        .filter(waiting_queue::reservation_id.eq(reservation_id))
        .set(waiting_queue::status.eq(status.as_str()))
        .execute(conn)?)
}
}
