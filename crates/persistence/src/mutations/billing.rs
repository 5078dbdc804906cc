// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Billing document and invoice sequence writes.

use alfio_domain::{BillingDocument, BillingDocumentStatus, BillingDocumentType};
use diesel::prelude::*;
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::data_models::from_timestamp;
use crate::diesel_schema::{billing_documents, invoice_sequences};
use crate::error::PersistenceError;

backend_fn! {
/// Inserts a billing document and returns its id.
///
/// # Errors
///
/// Returns an error if the insert or model serialization fails.
pub fn insert_billing_document(
    conn: &mut _,
    document: &BillingDocument,
) -> Result<i64, PersistenceError> {
    let model: String = serde_json::to_string(&document.model)?;
    diesel::insert_into(billing_documents::table)
        .values((
            billing_documents::reservation_id.eq(&document.reservation_id),
            billing_documents::organization_id.eq(document.organization_id),
            billing_documents::number.eq(&document.number),
            billing_documents::document_type.eq(document.document_type.as_str()),
            billing_documents::status.eq(document.status.as_str()),
            billing_documents::model.eq(model),
            billing_documents::generated_at.eq(from_timestamp(document.generated_at)),
        ))
        .execute(conn)?;
    let document_id: i64 = conn.get_last_insert_rowid()?;
    info!(
        document_id,
        reservation_id = %document.reservation_id,
        number = %document.number,
        document_type = document.document_type.as_str(),
        "Created billing document"
    );
    Ok(document_id)
}
}

backend_fn! {
/// Marks the VALID documents of a type NOT_VALID.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn invalidate_billing_documents(
    conn: &mut _,
    reservation_id: &str,
    document_type: BillingDocumentType,
) -> Result<usize, PersistenceError> {
    Ok(diesel::update(billing_documents::table)
        .filter(billing_documents::reservation_id.eq(reservation_id))
        .filter(billing_documents::document_type.eq(document_type.as_str()))
        .filter(billing_documents::status.eq(BillingDocumentStatus::Valid.as_str()))
        .set(billing_documents::status.eq(BillingDocumentStatus::NotValid.as_str()))
        .execute(conn)?)
}
}

backend_fn! {
/// Creates the invoice sequence of an organization.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_invoice_sequence(
    conn: &mut _,
    organization_id: i64,
    next_value: i64,
) -> Result<(), PersistenceError> {
    diesel::insert_into(invoice_sequences::table)
        .values((
            invoice_sequences::organization_id.eq(organization_id),
            invoice_sequences::next_value.eq(next_value),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Stores the next value of an organization's invoice sequence.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_invoice_sequence(
    conn: &mut _,
    organization_id: i64,
    next_value: i64,
) -> Result<(), PersistenceError> {
    diesel::update(invoice_sequences::table.find(organization_id))
        .set(invoice_sequences::next_value.eq(next_value))
        .execute(conn)?;
    Ok(())
}
}
