// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Waiting queue queries.

use alfio_domain::{WaitingQueueStatus, WaitingQueueSubscription};
use diesel::prelude::*;

use crate::data_models::WaitingQueueRow;
use crate::diesel_schema::waiting_queue;
use crate::error::PersistenceError;

backend_fn! {
/// Finds the subscription that received a reservation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_subscription_by_reservation(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Option<WaitingQueueSubscription>, PersistenceError> {
    waiting_queue::table
        .filter(waiting_queue::reservation_id.eq(reservation_id))
        .select(WaitingQueueRow::as_select())
        .first(conn)
        .optional()?
        .map(WaitingQueueSubscription::try_from)
        .transpose()
}
}

backend_fn! {
/// Loads every subscription of an event, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_subscriptions(
    conn: &mut _,
    event_id: i64,
) -> Result<Vec<WaitingQueueSubscription>, PersistenceError> {
    waiting_queue::table
        .filter(waiting_queue::event_id.eq(event_id))
        .order((waiting_queue::created_at.asc(), waiting_queue::id.asc()))
        .select(WaitingQueueRow::as_select())
        .load(conn)?
        .into_iter()
        .map(WaitingQueueSubscription::try_from)
        .collect()
}
}

backend_fn! {
/// Counts the WAITING subscriptions of an event without locking them.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_waiting_subscriptions(conn: &mut _, event_id: i64) -> Result<u32, PersistenceError> {
    let count: i64 = waiting_queue::table
        .filter(waiting_queue::event_id.eq(event_id))
        .filter(waiting_queue::status.eq(WaitingQueueStatus::Waiting.as_str()))
        .count()
        .get_result(conn)?;
    crate::data_models::to_u32(count, "waiting_queue.count")
}
}

/// Loads the WAITING subscriptions of an event in FIFO order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_waiting_subscriptions_sqlite(
    conn: &mut diesel::SqliteConnection,
    event_id: i64,
) -> Result<Vec<WaitingQueueSubscription>, PersistenceError> {
    waiting_queue::table
        .filter(waiting_queue::event_id.eq(event_id))
        .filter(waiting_queue::status.eq(WaitingQueueStatus::Waiting.as_str()))
        .order((waiting_queue::created_at.asc(), waiting_queue::id.asc()))
        .select(WaitingQueueRow::as_select())
        .load(conn)?
        .into_iter()
        .map(WaitingQueueSubscription::try_from)
        .collect()
}

/// Loads the WAITING subscriptions of an event in FIFO order, skipping rows
/// another redistribution holds.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_waiting_subscriptions_mysql(
    conn: &mut diesel::MysqlConnection,
    event_id: i64,
) -> Result<Vec<WaitingQueueSubscription>, PersistenceError> {
    waiting_queue::table
        .filter(waiting_queue::event_id.eq(event_id))
        .filter(waiting_queue::status.eq(WaitingQueueStatus::Waiting.as_str()))
        .order((waiting_queue::created_at.asc(), waiting_queue::id.asc()))
        .select(WaitingQueueRow::as_select())
        .for_update()
        .skip_locked()
        .load(conn)?
        .into_iter()
        .map(WaitingQueueSubscription::try_from)
        .collect()
}
