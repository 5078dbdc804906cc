// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing document and invoice sequence queries.

use alfio_domain::{BillingDocument, BillingDocumentStatus, BillingDocumentType};
use diesel::prelude::*;

use crate::data_models::BillingDocumentRow;
use crate::diesel_schema::{billing_documents, invoice_sequences};
use crate::error::PersistenceError;

backend_fn! {
/// Finds the VALID document of a given type for a reservation.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_valid_billing_document(
    conn: &mut _,
    reservation_id: &str,
    document_type: BillingDocumentType,
) -> Result<Option<BillingDocument>, PersistenceError> {
    billing_documents::table
        .filter(billing_documents::reservation_id.eq(reservation_id))
        .filter(billing_documents::document_type.eq(document_type.as_str()))
        .filter(billing_documents::status.eq(BillingDocumentStatus::Valid.as_str()))
        .order(billing_documents::id.desc())
        .select(BillingDocumentRow::as_select())
        .first(conn)
        .optional()?
        .map(BillingDocument::try_from)
        .transpose()
}
}

backend_fn! {
/// Loads every document of a reservation, valid or not.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_billing_documents(
    conn: &mut _,
    reservation_id: &str,
) -> Result<Vec<BillingDocument>, PersistenceError> {
    billing_documents::table
        .filter(billing_documents::reservation_id.eq(reservation_id))
        .order(billing_documents::id.asc())
        .select(BillingDocumentRow::as_select())
        .load(conn)?
        .into_iter()
        .map(BillingDocument::try_from)
        .collect()
}
}

/// Reads the next invoice sequence value of an organization.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn lock_invoice_sequence_sqlite(
    conn: &mut diesel::SqliteConnection,
    organization_id: i64,
) -> Result<Option<i64>, PersistenceError> {
    Ok(invoice_sequences::table
        .find(organization_id)
        .select(invoice_sequences::next_value)
        .first(conn)
        .optional()?)
}

/// Reads the next invoice sequence value of an organization for update.
///
/// # Errors
///
/// Returns an error if the query fails.
#[cfg(feature = "mysql")]
pub fn lock_invoice_sequence_mysql(
    conn: &mut diesel::MysqlConnection,
    organization_id: i64,
) -> Result<Option<i64>, PersistenceError> {
    Ok(invoice_sequences::table
        .find(organization_id)
        .select(invoice_sequences::next_value)
        .for_update()
        .first(conn)
        .optional()?)
}
