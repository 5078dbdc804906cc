// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transaction and additional service writes.

use alfio_domain::{
    AdditionalService, AdditionalServiceItem, AdditionalServiceItemStatus, Transaction,
};
use diesel::prelude::*;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::data_models::from_timestamp;
use crate::diesel_schema::{additional_service_items, additional_services, transactions};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts the transaction of a reservation and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails or the reservation already has one.
pub fn insert_transaction(conn: &mut _, transaction: &Transaction) -> Result<i64, PersistenceError> {
    let metadata: String = serde_json::to_string(&transaction.metadata)?;
    diesel::insert_into(transactions::table)
        .values((
            transactions::reservation_id.eq(&transaction.reservation_id),
            transactions::gateway_transaction_id.eq(&transaction.gateway_transaction_id),
            transactions::gateway_payment_id.eq(transaction.gateway_payment_id.as_deref()),
            transactions::amount.eq(transaction.amount),
            transactions::currency.eq(&transaction.currency),
            transactions::description.eq(&transaction.description),
            transactions::payment_proxy.eq(transaction.payment_proxy.as_str()),
            transactions::platform_fee.eq(transaction.platform_fee),
            transactions::gateway_fee.eq(transaction.gateway_fee),
            transactions::status.eq(transaction.status.as_str()),
            transactions::created_at.eq(from_timestamp(transaction.created_at)),
            transactions::metadata.eq(metadata),
        ))
        .execute(conn)?;
    let transaction_id: i64 = conn.get_last_insert_rowid()?;
    debug!(
        transaction_id,
        reservation_id = %transaction.reservation_id,
        status = transaction.status.as_str(),
        "Inserted transaction"
    );
    Ok(transaction_id)
}
}

backend_fn! {
/// Updates the mutable columns of a transaction.
///
/// # Errors
///
/// Returns an error if the update or metadata serialization fails.
pub fn update_transaction(conn: &mut _, transaction: &Transaction) -> Result<(), PersistenceError> {
    let metadata: String = serde_json::to_string(&transaction.metadata)?;
    diesel::update(transactions::table.find(transaction.id))
        .set((
            transactions::gateway_transaction_id.eq(&transaction.gateway_transaction_id),
            transactions::gateway_payment_id.eq(transaction.gateway_payment_id.as_deref()),
            transactions::amount.eq(transaction.amount),
            transactions::payment_proxy.eq(transaction.payment_proxy.as_str()),
            transactions::platform_fee.eq(transaction.platform_fee),
            transactions::gateway_fee.eq(transaction.gateway_fee),
            transactions::status.eq(transaction.status.as_str()),
            transactions::metadata.eq(metadata),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Deletes the transaction of a reservation.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_transaction(conn: &mut _, reservation_id: &str) -> Result<usize, PersistenceError> {
    Ok(
        diesel::delete(transactions::table.filter(transactions::reservation_id.eq(reservation_id)))
            .execute(conn)?,
    )
}
}

backend_fn! {
/// Inserts an additional service and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_additional_service(
    conn: &mut _,
    service: &AdditionalService,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(additional_services::table)
        .values((
            additional_services::event_id.eq(service.event_id),
            additional_services::name.eq(&service.name),
            additional_services::price.eq(service.price),
            additional_services::vat_status.eq(service.vat_status.as_str()),
            additional_services::policy.eq(service.policy.as_str()),
            additional_services::max_per_ticket.eq(service.max_per_ticket.map(i64::from)),
            additional_services::active.eq(service.active),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Inserts an additional service item and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_additional_service_item(
    conn: &mut _,
    item: &AdditionalServiceItem,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(additional_service_items::table)
        .values((
            additional_service_items::uuid.eq(&item.uuid),
            additional_service_items::reservation_id.eq(&item.reservation_id),
            additional_service_items::additional_service_id.eq(item.additional_service_id),
            additional_service_items::status.eq(item.status.as_str()),
            additional_service_items::src_price.eq(item.src_price),
            additional_service_items::final_price.eq(item.final_price),
            additional_service_items::vat.eq(item.vat),
            additional_service_items::discount.eq(item.discount),
        ))
        .execute(conn)?;
    conn.get_last_insert_rowid()
}
}

backend_fn! {
/// Moves every additional service item of a reservation to `status`.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_additional_service_items_status(
    conn: &mut _,
    reservation_id: &str,
    status: AdditionalServiceItemStatus,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(additional_service_items::table)
        .filter(additional_service_items::reservation_id.eq(reservation_id))
        .set(additional_service_items::status.eq(status.as_str()))
        .execute(conn)?)
}
}
